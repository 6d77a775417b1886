// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripherals used by the bootloader. Clocks stay at their reset configuration.

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::flash::Nvm;
use crate::uart::Uart;

const PORT_BASE: usize = 0x4100_0000;
const PORT_OUTSET: *mut u32 = (PORT_BASE + 0x18) as *mut u32;
const PORT_IN: *const u32 = (PORT_BASE + 0x20) as *const u32;
const PORT_PINCFG: usize = PORT_BASE + 0x40;
const PINCFG_INEN: u8 = 1 << 1;
const PINCFG_PULLEN: u8 = 1 << 2;

/// PA02, pulled up. Strapped low to force update mode.
const BOOT_MODE_PIN: u32 = 2;

pub struct BootModePin {
    _private: (),
}

impl BootModePin {
    fn new() -> Self {
        unsafe {
            let pincfg = (PORT_PINCFG + BOOT_MODE_PIN as usize) as *mut u8;
            pincfg.write_volatile(PINCFG_INEN | PINCFG_PULLEN);
            // With PULLEN set, OUT selects pull-up.
            PORT_OUTSET.write_volatile(1 << BOOT_MODE_PIN);
        }
        Self { _private: () }
    }
}

impl ErrorType for BootModePin {
    type Error = Infallible;
}

impl InputPin for BootModePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(unsafe { PORT_IN.read_volatile() } & (1 << BOOT_MODE_PIN) != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct Peripherals {
    pub flash: Nvm,
    pub uart: Uart,
    pub boot_pin: BootModePin,
}

pub fn init() -> Peripherals {
    Peripherals {
        flash: Nvm::new(),
        uart: Uart::new(),
        boot_pin: BootModePin::new(),
    }
}
