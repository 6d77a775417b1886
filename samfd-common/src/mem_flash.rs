// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RAM-backed flash with SAMC21 NVM geometry, for host-side simulation.

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

use crate::protocol::{FLASH_SIZE, NVM_PAGE_SIZE, NVM_ROW_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemFlashError(pub NorFlashErrorKind);

impl NorFlashError for MemFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.0
    }
}

/// Flash contents plus counters of the operations performed on them.
///
/// Programming follows NOR semantics: bits can only be cleared until the row is erased.
#[derive(Clone)]
pub struct MemFlash {
    data: Vec<u8>,
    pub erase_count: usize,
    pub write_count: usize,
    /// When set, every erase and write fails with `Other`.
    pub fail: bool,
}

impl MemFlash {
    /// Fully erased device.
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; FLASH_SIZE as usize],
            erase_count: 0,
            write_count: 0,
            fail: false,
        }
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Place bytes directly, bypassing NOR semantics and counters.
    pub fn preload(&mut self, addr: u32, bytes: &[u8]) {
        let start = addr as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Same contents with fresh counters, as seen after a power cycle.
    pub fn power_cycle(&self) -> Self {
        Self {
            data: self.data.clone(),
            ..Self::new()
        }
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<(), MemFlashError> {
        let end = offset as usize + len;
        if end > self.data.len() {
            return Err(MemFlashError(NorFlashErrorKind::OutOfBounds));
        }
        Ok(())
    }

    fn check_fail(&self) -> Result<(), MemFlashError> {
        if self.fail {
            return Err(MemFlashError(NorFlashErrorKind::Other));
        }
        Ok(())
    }
}

impl Default for MemFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for MemFlash {
    type Error = MemFlashError;
}

impl ReadNorFlash for MemFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.check_range(offset, bytes.len())?;
        let start = offset as usize;
        bytes.copy_from_slice(&self.data[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl NorFlash for MemFlash {
    const WRITE_SIZE: usize = NVM_PAGE_SIZE;
    const ERASE_SIZE: usize = NVM_ROW_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        self.check_fail()?;
        if from > to || from as usize % NVM_ROW_SIZE != 0 || to as usize % NVM_ROW_SIZE != 0 {
            return Err(MemFlashError(NorFlashErrorKind::NotAligned));
        }
        self.check_range(from, (to - from) as usize)?;

        self.data[from as usize..to as usize].fill(0xFF);
        self.erase_count += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.check_fail()?;
        if offset as usize % NVM_PAGE_SIZE != 0 || bytes.len() % NVM_PAGE_SIZE != 0 {
            return Err(MemFlashError(NorFlashErrorKind::NotAligned));
        }
        self.check_range(offset, bytes.len())?;

        let start = offset as usize;
        for (cell, &byte) in self.data[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= byte;
        }
        self.write_count += 1;
        Ok(())
    }
}
