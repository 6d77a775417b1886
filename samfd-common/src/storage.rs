// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Page-granular flash helpers on top of `embedded-storage`.

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

use crate::protocol::{APP_OFFSET, CRC32, PAGE_SIZE};

/// Erase the row behind `addr` and program one full page.
///
/// `addr` must be page aligned and `PAGE_SIZE` must be a multiple of the
/// driver's erase and write granules; the driver reports `NotAligned` otherwise.
pub fn program_page<F: NorFlash>(
    flash: &mut F,
    addr: u32,
    data: &[u8; PAGE_SIZE],
) -> Result<(), F::Error> {
    flash.erase(addr, addr + PAGE_SIZE as u32)?;
    flash.write(addr, data)
}

/// CRC-32 (ISO HDLC) over `length` bytes of the application region.
pub fn image_crc32<F: ReadNorFlash>(flash: &mut F, length: u32) -> Result<u32, F::Error> {
    let mut digest = CRC32.digest();
    let mut remaining = length as usize;
    let mut addr = APP_OFFSET;
    let mut chunk = [0u8; PAGE_SIZE];

    while remaining > 0 {
        let n = remaining.min(chunk.len());
        flash.read(addr, &mut chunk[..n])?;
        digest.update(&chunk[..n]);
        addr += n as u32;
        remaining -= n;
    }

    Ok(digest.finalize())
}
