// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Polled SERCOM0 USART (8N1, PA05 = RX on PAD1, PA06 = TX on PAD2).
//!
//! Reads are bounded: a call that sees no byte within [`RX_TIMEOUT_SPINS`]
//! polls fails with `TimedOut`, which the frame reader treats as a short read.

use embedded_io::{ErrorKind, ErrorType, Read, Write};
use samfd_common::BAUD_RATE;

const SERCOM0_BASE: usize = 0x4200_0400;
const USART_CTRLA: *mut u32 = SERCOM0_BASE as *mut u32;
const USART_CTRLB: *mut u32 = (SERCOM0_BASE + 0x04) as *mut u32;
const USART_BAUD: *mut u16 = (SERCOM0_BASE + 0x0C) as *mut u16;
const USART_INTFLAG: *const u8 = (SERCOM0_BASE + 0x18) as *const u8;
const USART_STATUS: *mut u16 = (SERCOM0_BASE + 0x1A) as *mut u16;
const USART_SYNCBUSY: *const u32 = (SERCOM0_BASE + 0x1C) as *const u32;
const USART_DATA: *mut u32 = (SERCOM0_BASE + 0x28) as *mut u32;

const CTRLA_SWRST: u32 = 1 << 0;
const CTRLA_ENABLE: u32 = 1 << 1;
const CTRLA_MODE_INTERNAL_CLOCK: u32 = 1 << 2;
const CTRLA_TXPO_PAD2: u32 = 1 << 16;
const CTRLA_RXPO_PAD1: u32 = 1 << 20;
const CTRLA_DORD_LSB: u32 = 1 << 30;

const CTRLB_TXEN: u32 = 1 << 16;
const CTRLB_RXEN: u32 = 1 << 17;

const INTFLAG_DRE: u8 = 1 << 0;
const INTFLAG_TXC: u8 = 1 << 1;
const INTFLAG_RXC: u8 = 1 << 2;

const STATUS_BUFOVF: u16 = 1 << 2;

const MCLK_APBCMASK: *mut u32 = 0x4000_081C as *mut u32;
const APBCMASK_SERCOM0: u32 = 1 << 1;

/// GCLK peripheral channel for SERCOM0 core, fed from generator 0.
const GCLK_PCHCTRL_SERCOM0_CORE: *mut u32 = (0x4000_1C80 + 4 * 19) as *mut u32;
const PCHCTRL_CHEN: u32 = 1 << 6;

const PORT_BASE: usize = 0x4100_0000;
const PORT_PMUX: usize = PORT_BASE + 0x30;
const PORT_PINCFG: usize = PORT_BASE + 0x40;
const PINCFG_PMUXEN: u8 = 1 << 0;
const PMUX_FUNCTION_D: u8 = 0x3;
const RX_PIN: usize = 5;
const TX_PIN: usize = 6;

/// GCLK0 runs from OSC48M divided by 12 out of reset.
const CORE_CLOCK_HZ: u64 = 4_000_000;

/// Arithmetic baud value for 16x oversampling.
const BAUD_VALUE: u16 = (65_536 * (CORE_CLOCK_HZ - 16 * BAUD_RATE as u64) / CORE_CLOCK_HZ) as u16;

/// Polls per byte before a read gives up, roughly 50 ms at 4 MHz.
pub const RX_TIMEOUT_SPINS: u32 = 20_000;

/// Polls before a stuck transmitter is reported. One byte at 115200 baud
/// needs well under a thousand.
pub const TX_TIMEOUT_SPINS: u32 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum UartError {
    TimedOut,
    Overrun,
}

impl embedded_io::Error for UartError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TimedOut => ErrorKind::TimedOut,
            Self::Overrun => ErrorKind::Other,
        }
    }
}

pub struct Uart {
    _private: (),
}

impl Uart {
    pub fn new() -> Self {
        unsafe {
            MCLK_APBCMASK.write_volatile(MCLK_APBCMASK.read_volatile() | APBCMASK_SERCOM0);
            GCLK_PCHCTRL_SERCOM0_CORE.write_volatile(PCHCTRL_CHEN);

            route_pin(RX_PIN);
            route_pin(TX_PIN);

            USART_CTRLA.write_volatile(CTRLA_SWRST);
            wait_sync();

            USART_CTRLA.write_volatile(
                CTRLA_MODE_INTERNAL_CLOCK | CTRLA_TXPO_PAD2 | CTRLA_RXPO_PAD1 | CTRLA_DORD_LSB,
            );
            USART_CTRLB.write_volatile(CTRLB_TXEN | CTRLB_RXEN);
            wait_sync();
            USART_BAUD.write_volatile(BAUD_VALUE);

            USART_CTRLA.write_volatile(USART_CTRLA.read_volatile() | CTRLA_ENABLE);
            wait_sync();
        }
        Self { _private: () }
    }

    /// Drain the transmitter and put SERCOM0 back in its reset state.
    pub fn release(self) {
        if wait_flag(INTFLAG_DRE).is_err() {
            defmt::warn!("UART: transmitter did not drain before release");
        }
        unsafe {
            USART_CTRLA.write_volatile(CTRLA_SWRST);
        }
        wait_sync();
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, UartError> {
        let status = unsafe { USART_STATUS.read_volatile() };
        if status & STATUS_BUFOVF != 0 {
            unsafe { USART_STATUS.write_volatile(STATUS_BUFOVF) };
            return Err(UartError::Overrun);
        }

        if unsafe { USART_INTFLAG.read_volatile() } & INTFLAG_RXC == 0 {
            return Ok(None);
        }
        Ok(Some(unsafe { USART_DATA.read_volatile() } as u8))
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), UartError> {
        wait_flag(INTFLAG_DRE)?;
        unsafe { USART_DATA.write_volatile(u32::from(byte)) };
        Ok(())
    }
}

fn wait_flag(flag: u8) -> Result<(), UartError> {
    for _ in 0..TX_TIMEOUT_SPINS {
        if unsafe { USART_INTFLAG.read_volatile() } & flag != 0 {
            return Ok(());
        }
    }
    Err(UartError::TimedOut)
}

fn wait_sync() {
    for _ in 0..TX_TIMEOUT_SPINS {
        if unsafe { USART_SYNCBUSY.read_volatile() } == 0 {
            return;
        }
    }
    defmt::warn!("UART: register sync timed out");
}

unsafe fn route_pin(pin: usize) {
    let pmux = (PORT_PMUX + pin / 2) as *mut u8;
    let shift = if pin % 2 == 0 { 0 } else { 4 };
    let value = (pmux.read_volatile() & !(0xF << shift)) | (PMUX_FUNCTION_D << shift);
    pmux.write_volatile(value);

    let pincfg = (PORT_PINCFG + pin) as *mut u8;
    pincfg.write_volatile(pincfg.read_volatile() | PINCFG_PMUXEN);
}

impl ErrorType for Uart {
    type Error = UartError;
}

impl Read for Uart {
    /// Wait (bounded) for the first byte, then take whatever else is already buffered.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut first = None;
        for _ in 0..RX_TIMEOUT_SPINS {
            if let Some(byte) = self.try_read_byte()? {
                first = Some(byte);
                break;
            }
        }
        buf[0] = first.ok_or(UartError::TimedOut)?;

        let mut n = 1;
        while n < buf.len() {
            match self.try_read_byte()? {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for Uart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.write_byte(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        wait_flag(INTFLAG_TXC)
    }
}
