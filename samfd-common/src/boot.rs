// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot decision: stay in update mode or hand over to the application.

use embedded_storage::nor_flash::NorFlash;

use crate::header::ImageHeader;
use crate::protocol::{read_u32, APP_OFFSET, FLASH_SIZE, RAM_SIZE, RAM_START};

/// First two words of the application's vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VectorTable {
    pub initial_sp: u32,
    pub reset_vector: u32,
}

impl VectorTable {
    pub fn read_from<F: NorFlash>(flash: &mut F, addr: u32) -> Result<Self, F::Error> {
        let mut words = [0u8; 8];
        flash.read(addr, &mut words)?;
        Ok(Self {
            initial_sp: read_u32(&words, 0),
            reset_vector: read_u32(&words, 4),
        })
    }

    /// Stack pointer inside RAM (top of RAM included), reset handler inside the application region.
    pub fn is_plausible(&self) -> bool {
        let sp_ok = (RAM_START..=RAM_START + RAM_SIZE).contains(&self.initial_sp);
        let reset_ok = (APP_OFFSET..FLASH_SIZE).contains(&(self.reset_vector & !1));
        sp_ok && reset_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateReason {
    /// Boot-mode pin asserted.
    Forced,
    /// Header not committed: fresh device or interrupted transfer.
    NoValidImage,
    /// Committed image whose vector table cannot be right.
    BadVectorTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootDecision {
    Update(UpdateReason),
    Launch(VectorTable),
}

/// Pick the boot path, writing a default header on the very first boot.
pub fn decide<F: NorFlash>(flash: &mut F, force_update: bool) -> Result<BootDecision, F::Error> {
    let mut header = ImageHeader::load(flash)?;
    if !header.is_initialized() {
        info!("Header: not initialized, writing defaults");
        header = ImageHeader::default_new();
        header.store(flash)?;
    }

    if force_update {
        return Ok(BootDecision::Update(UpdateReason::Forced));
    }

    if !header.valid {
        return Ok(BootDecision::Update(UpdateReason::NoValidImage));
    }

    let vt = VectorTable::read_from(flash, APP_OFFSET)?;
    if !vt.is_plausible() {
        warn!(
            "Header: valid image with bad vector table SP=0x{:08x} reset=0x{:08x}",
            vt.initial_sp,
            vt.reset_vector
        );
        return Ok(BootDecision::Update(UpdateReason::BadVectorTable));
    }

    info!(
        "Header: version {} ({} bytes) committed",
        header.version,
        header.length
    );
    Ok(BootDecision::Launch(vt))
}
