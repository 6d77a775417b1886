// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use core::fmt;

use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

/// Update state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateState {
    /// No transfer in progress.
    Idle,
    /// Between an accepted `Start` and a successful `Stop`.
    Flashing {
        length: u32,
        version: u16,
        bytes_written: u32,
    },
}

impl UpdateState {
    pub fn is_flashing(&self) -> bool {
        matches!(self, Self::Flashing { .. })
    }
}

/// What the session does after an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Continue(UpdateState),
    /// `Boot` was accepted; the caller re-runs the boot decision.
    Boot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashFault {
    NotAligned,
    OutOfBounds,
    Other,
}

impl From<NorFlashErrorKind> for FlashFault {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => Self::NotAligned,
            NorFlashErrorKind::OutOfBounds => Self::OutOfBounds,
            _ => Self::Other,
        }
    }
}

/// Reasons a command is refused. All of them are fatal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    AlreadyStarted,
    NotStarted,
    PageOutOfRange(u32),
    CrcMismatch { expected: u32, actual: u32 },
    LengthMismatch { expected: u32, written: u32 },
    /// `Start` declared zero bytes.
    EmptyImage,
    BootWhileFlashing,
    UnknownCommand(u32),
    Flash(FlashFault),
}

impl Rejection {
    pub(super) fn flash<E: NorFlashError>(err: E) -> Self {
        Self::Flash(err.kind().into())
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => f.write_str("transfer already started"),
            Self::NotStarted => f.write_str("no transfer started"),
            Self::PageOutOfRange(page) => write!(f, "page {page} outside the writable region"),
            Self::CrcMismatch { expected, actual } => {
                write!(f, "CRC mismatch: frame 0x{expected:08x}, computed 0x{actual:08x}")
            }
            Self::LengthMismatch { expected, written } => {
                write!(f, "wrote {written} of {expected} declared bytes")
            }
            Self::EmptyImage => f.write_str("zero-length image"),
            Self::BootWhileFlashing => f.write_str("boot requested during a transfer"),
            Self::UnknownCommand(raw) => write!(f, "unknown command type 0x{raw:08x}"),
            Self::Flash(fault) => write!(f, "flash error: {fault:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Rejection {}
