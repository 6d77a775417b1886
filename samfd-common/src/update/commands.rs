// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use embedded_storage::nor_flash::NorFlash;

use super::state::{Rejection, Step, UpdateState};
use crate::header::ImageHeader;
use crate::protocol::{Command, WritePage, NUM_PAGES, PAGE_SIZE, START_PAGE};
use crate::storage;

/// Dispatch a command to its handler.
pub fn dispatch_command<F: NorFlash>(
    flash: &mut F,
    state: UpdateState,
    cmd: Command,
) -> Result<Step, Rejection> {
    match cmd {
        Command::Start { length, version } => handle_start(flash, state, length, version),
        Command::Write(write) => handle_write(flash, state, &write),
        Command::Stop => handle_stop(flash, state),
        Command::Boot => handle_boot(state),
    }
}

/// Handle `Start`: invalidate the header before any page is touched.
fn handle_start<F: NorFlash>(
    flash: &mut F,
    state: UpdateState,
    length: u32,
    version: u16,
) -> Result<Step, Rejection> {
    if state.is_flashing() {
        warn!("Start: transfer already in progress");
        return Err(Rejection::AlreadyStarted);
    }
    if length == 0 {
        warn!("Start: zero-length image");
        return Err(Rejection::EmptyImage);
    }

    let mut header = ImageHeader::load(flash).map_err(Rejection::flash)?;
    header.begin(length, version);
    header.store(flash).map_err(Rejection::flash)?;

    info!("Start: length={}, version={}", length, version);
    Ok(Step::Continue(UpdateState::Flashing {
        length,
        version,
        bytes_written: 0,
    }))
}

/// Handle `Write`: fence the page range, check the frame CRC, program the page.
fn handle_write<F: NorFlash>(
    flash: &mut F,
    mut state: UpdateState,
    write: &WritePage,
) -> Result<Step, Rejection> {
    let UpdateState::Flashing {
        ref mut bytes_written,
        ..
    } = state
    else {
        warn!("Write: no transfer started");
        return Err(Rejection::NotStarted);
    };

    if !(START_PAGE..NUM_PAGES).contains(&write.page) {
        warn!("Write: page {} outside writable region", write.page);
        return Err(Rejection::PageOutOfRange(write.page));
    }

    let actual = write.checksum();
    if actual != write.crc {
        warn!(
            "Write: CRC mismatch on page {}: frame 0x{:08x}, computed 0x{:08x}",
            write.page,
            write.crc,
            actual
        );
        return Err(Rejection::CrcMismatch {
            expected: write.crc,
            actual,
        });
    }

    storage::program_page(flash, write.address(), &write.data).map_err(Rejection::flash)?;
    *bytes_written = bytes_written.saturating_add(PAGE_SIZE as u32);

    debug!("Write: page {} programmed", write.page);
    Ok(Step::Continue(state))
}

/// Handle `Stop`: commit the header once every declared byte has been written.
fn handle_stop<F: NorFlash>(flash: &mut F, state: UpdateState) -> Result<Step, Rejection> {
    let UpdateState::Flashing {
        length,
        bytes_written,
        ..
    } = state
    else {
        warn!("Stop: no transfer started");
        return Err(Rejection::NotStarted);
    };

    if bytes_written != length {
        warn!("Stop: incomplete image {} != {}", bytes_written, length);
        return Err(Rejection::LengthMismatch {
            expected: length,
            written: bytes_written,
        });
    }

    let crc = storage::image_crc32(flash, length).map_err(Rejection::flash)?;
    let mut header = ImageHeader::load(flash).map_err(Rejection::flash)?;
    header.commit(crc);
    header.store(flash).map_err(Rejection::flash)?;

    info!("Stop: image committed, crc=0x{:08x}", crc);
    Ok(Step::Continue(UpdateState::Idle))
}

/// Handle `Boot`: refused while a transfer is open.
fn handle_boot(state: UpdateState) -> Result<Step, Rejection> {
    if state.is_flashing() {
        warn!("Boot: refused while flashing");
        return Err(Rejection::BootWhileFlashing);
    }
    Ok(Step::Boot)
}
