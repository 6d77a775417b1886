// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Image header persisted in the reserved page at [`HEADER_OFFSET`].

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

use crate::protocol::{read_u32, HEADER_OFFSET, PAGE_SIZE};
use crate::storage;

pub const IMAGE_HEADER_MAGIC: u32 = 0x5AFD_B007;

/// Encoded size; the rest of the header page stays erased.
pub const HEADER_SIZE: usize = 20;

/// Record gating whether the application image may run.
///
/// Layout (little endian):
/// `magic:u32 | valid:u8 | reserved:[u8;3] | crc:u32 | length:u32 | version:u16 | reserved:[u8;2]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageHeader {
    pub magic: u32,
    /// Application at `APP_OFFSET` is safe to jump to.
    pub valid: bool,
    /// CRC-32 of the committed image.
    pub crc: u32,
    pub length: u32,
    pub version: u16,
}

impl ImageHeader {
    pub fn default_new() -> Self {
        Self {
            magic: IMAGE_HEADER_MAGIC,
            valid: false,
            crc: 0,
            length: 0,
            version: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.magic == IMAGE_HEADER_MAGIC
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4] = u8::from(self.valid);
        out[8..12].copy_from_slice(&self.crc.to_le_bytes());
        out[12..16].copy_from_slice(&self.length.to_le_bytes());
        out[16..18].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: read_u32(bytes, 0),
            valid: bytes[4] == 1,
            crc: read_u32(bytes, 8),
            length: read_u32(bytes, 12),
            version: u16::from_le_bytes([bytes[16], bytes[17]]),
        }
    }

    /// Read the header page. Erased flash yields a header without magic.
    pub fn load<F: ReadNorFlash>(flash: &mut F) -> Result<Self, F::Error> {
        let mut bytes = [0u8; HEADER_SIZE];
        flash.read(HEADER_OFFSET, &mut bytes)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Rewrite the header page (erase row, program one padded page).
    pub fn store<F: NorFlash>(&self, flash: &mut F) -> Result<(), F::Error> {
        let mut page = [0xFFu8; PAGE_SIZE];
        page[..HEADER_SIZE].copy_from_slice(&self.to_bytes());
        storage::program_page(flash, HEADER_OFFSET, &page)
    }

    /// Mark a transfer as in progress. The image stops being trusted until [`commit`](Self::commit).
    pub fn begin(&mut self, length: u32, version: u16) {
        self.magic = IMAGE_HEADER_MAGIC;
        self.valid = false;
        self.crc = 0;
        self.length = length;
        self.version = version;
    }

    pub fn commit(&mut self, crc: u32) {
        self.valid = true;
        self.crc = crc;
    }
}
