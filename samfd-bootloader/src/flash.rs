// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! NVM controller driver exposing the SAMC21 main array as `embedded-storage` NOR flash.
//!
//! The array is memory mapped at address 0, so reads are plain volatile
//! loads. Programming is the NVMCTRL sequence:
//!   1. page buffer clear (PBC)
//!   2. fill the page buffer with 16-bit writes at the target address
//!   3. write page (WP) with ADDR pointing at the page
//!
//! Rows (4 pages) must be erased (ER) before their pages are programmed.

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use samfd_common::{FLASH_SIZE, NVM_PAGE_SIZE, NVM_ROW_SIZE};

const NVMCTRL_BASE: usize = 0x4100_4000;
const NVMCTRL_CTRLA: *mut u16 = NVMCTRL_BASE as *mut u16;
const NVMCTRL_CTRLB: *mut u32 = (NVMCTRL_BASE + 0x04) as *mut u32;
const NVMCTRL_INTFLAG: *const u8 = (NVMCTRL_BASE + 0x14) as *const u8;
const NVMCTRL_STATUS: *mut u16 = (NVMCTRL_BASE + 0x18) as *mut u16;
const NVMCTRL_ADDR: *mut u32 = (NVMCTRL_BASE + 0x1C) as *mut u32;

const CTRLA_CMDEX: u16 = 0xA5 << 8;
const CMD_ERASE_ROW: u16 = 0x02;
const CMD_WRITE_PAGE: u16 = 0x04;
const CMD_PAGE_BUFFER_CLEAR: u16 = 0x44;

const CTRLB_MANW: u32 = 1 << 7;
const INTFLAG_READY: u8 = 1 << 0;

const STATUS_LOAD: u16 = 1 << 1;
const STATUS_PROGE: u16 = 1 << 2;
const STATUS_LOCKE: u16 = 1 << 3;
const STATUS_NVME: u16 = 1 << 4;
const STATUS_ERRORS: u16 = STATUS_PROGE | STATUS_LOCKE | STATUS_NVME;

/// Upper bound on READY polls before a command is declared hung.
const READY_SPINS: u32 = 1_000_000;

const NVM_SIZE: usize = FLASH_SIZE as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum NvmError {
    NotAligned,
    OutOfBounds,
    /// PROGE: invalid command or address.
    Program,
    /// LOCKE: region locked.
    Locked,
    /// NVME: controller reported a failed operation.
    Nvm,
    Timeout,
}

impl NorFlashError for NvmError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Self::NotAligned => NorFlashErrorKind::NotAligned,
            Self::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            Self::Program | Self::Locked | Self::Nvm | Self::Timeout => NorFlashErrorKind::Other,
        }
    }
}

pub struct Nvm {
    _private: (),
}

impl Nvm {
    /// Take the controller. Manual write mode: pages are committed only by WP.
    pub fn new() -> Self {
        unsafe {
            NVMCTRL_CTRLB.write_volatile(NVMCTRL_CTRLB.read_volatile() | CTRLB_MANW);
        }
        Self { _private: () }
    }

    fn wait_ready(&self) -> Result<(), NvmError> {
        for _ in 0..READY_SPINS {
            if unsafe { NVMCTRL_INTFLAG.read_volatile() } & INTFLAG_READY != 0 {
                return Ok(());
            }
        }
        Err(NvmError::Timeout)
    }

    fn clear_status(&self) {
        unsafe {
            NVMCTRL_STATUS.write_volatile(STATUS_LOAD | STATUS_ERRORS);
        }
    }

    fn check_status(&self) -> Result<(), NvmError> {
        let status = unsafe { NVMCTRL_STATUS.read_volatile() };
        if status & STATUS_PROGE != 0 {
            Err(NvmError::Program)
        } else if status & STATUS_LOCKE != 0 {
            Err(NvmError::Locked)
        } else if status & STATUS_NVME != 0 {
            Err(NvmError::Nvm)
        } else {
            Ok(())
        }
    }

    /// Issue a command. ADDR takes a 16-bit word address.
    fn execute(&self, cmd: u16, addr: Option<u32>) -> Result<(), NvmError> {
        self.wait_ready()?;
        if let Some(addr) = addr {
            unsafe { NVMCTRL_ADDR.write_volatile(addr / 2) };
        }
        unsafe { NVMCTRL_CTRLA.write_volatile(CTRLA_CMDEX | cmd) };
        self.wait_ready()
    }

    fn erase_row(&mut self, row_addr: u32) -> Result<(), NvmError> {
        self.clear_status();
        self.execute(CMD_ERASE_ROW, Some(row_addr))?;
        self.check_status()
    }

    fn write_page(&mut self, page_addr: u32, data: &[u8]) -> Result<(), NvmError> {
        self.execute(CMD_PAGE_BUFFER_CLEAR, None)?;
        self.clear_status();

        let dst = page_addr as *mut u16;
        for (i, pair) in data.chunks_exact(2).enumerate() {
            unsafe { dst.add(i).write_volatile(u16::from_le_bytes([pair[0], pair[1]])) };
        }

        self.execute(CMD_WRITE_PAGE, Some(page_addr))?;
        self.check_status()
    }
}

fn check_bounds(offset: u32, len: usize) -> Result<(), NvmError> {
    if offset as usize + len > NVM_SIZE {
        return Err(NvmError::OutOfBounds);
    }
    Ok(())
}

impl ErrorType for Nvm {
    type Error = NvmError;
}

impl ReadNorFlash for Nvm {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_bounds(offset, bytes.len())?;
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = unsafe { ((offset as usize + i) as *const u8).read_volatile() };
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        NVM_SIZE
    }
}

impl NorFlash for Nvm {
    const WRITE_SIZE: usize = NVM_PAGE_SIZE;
    const ERASE_SIZE: usize = NVM_ROW_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if from > to || from as usize % NVM_ROW_SIZE != 0 || to as usize % NVM_ROW_SIZE != 0 {
            return Err(NvmError::NotAligned);
        }
        check_bounds(from, (to - from) as usize)?;

        for row in (from..to).step_by(NVM_ROW_SIZE) {
            self.erase_row(row)?;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if offset as usize % NVM_PAGE_SIZE != 0 || bytes.len() % NVM_PAGE_SIZE != 0 {
            return Err(NvmError::NotAligned);
        }
        check_bounds(offset, bytes.len())?;

        for (i, page) in bytes.chunks_exact(NVM_PAGE_SIZE).enumerate() {
            self.write_page(offset + (i * NVM_PAGE_SIZE) as u32, page)?;
        }
        Ok(())
    }
}
