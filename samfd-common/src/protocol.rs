// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared protocol types for bootloader <-> flasher communication.
//!
//! Every command travels as one fixed-size frame: a 4-byte little-endian type
//! tag followed by a payload slot sized for the largest variant (`Write`).
//! The receiver always reads exactly [`FRAME_SIZE`] bytes before looking at
//! the tag, so every variant encodes to the same length.

use core::fmt;

use crc::{Crc, CRC_32_ISO_HDLC};

// --- Flash layout constants ---

/// SAMC21 NVM hardware page, the write granule.
pub const NVM_PAGE_SIZE: usize = 64;
/// SAMC21 NVM row, the erase granule.
pub const NVM_ROW_SIZE: usize = 4 * NVM_PAGE_SIZE;

/// Protocol page, one NVM row.
pub const PAGE_SIZE: usize = NVM_ROW_SIZE;
/// Number of protocol pages in the 256 KiB flash.
pub const NUM_PAGES: u32 = 1024;

pub const APP_OFFSET: u32 = 0x2000;
pub const HEADER_OFFSET: u32 = APP_OFFSET - PAGE_SIZE as u32;

/// Pages below this index belong to the bootloader and the header.
pub const START_PAGE: u32 = APP_OFFSET / PAGE_SIZE as u32;

/// Largest image the protocol can place in flash.
pub const APP_CAPACITY: u32 = (NUM_PAGES - START_PAGE) * PAGE_SIZE as u32;

pub const FLASH_SIZE: u32 = NUM_PAGES * PAGE_SIZE as u32;

pub const RAM_START: u32 = 0x2000_0000;
pub const RAM_SIZE: u32 = 32 * 1024;

pub const BAUD_RATE: u32 = 115_200;

// --- Wire layout ---

const TAG_SIZE: usize = 4;

/// `page` + `data` + `crc`.
pub const WRITE_PAYLOAD_SIZE: usize = 4 + PAGE_SIZE + 4;

pub const FRAME_SIZE: usize = TAG_SIZE + WRITE_PAYLOAD_SIZE;

const CRC_FIELD: core::ops::Range<usize> = 4 + PAGE_SIZE..WRITE_PAYLOAD_SIZE;

pub(crate) const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Numeric type tags carried in the first word of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum CommandType {
    Start = 0x13,
    Write = 0x42,
    Stop = 0x37,
    Boot = 0x69,
}

impl CommandType {
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0x13 => Some(Self::Start),
            0x42 => Some(Self::Write),
            0x37 => Some(Self::Stop),
            0x69 => Some(Self::Boot),
            _ => None,
        }
    }
}

/// One page of image data with its frame CRC.
#[derive(Clone, PartialEq, Eq)]
pub struct WritePage {
    pub page: u32,
    pub data: [u8; PAGE_SIZE],
    pub crc: u32,
}

impl WritePage {
    /// Build a page and seal its CRC.
    pub fn new(page: u32, data: [u8; PAGE_SIZE]) -> Self {
        let mut write = Self { page, data, crc: 0 };
        write.crc = write.checksum();
        write
    }

    /// CRC-32 of the write payload with the `crc` field zeroed.
    pub fn checksum(&self) -> u32 {
        let mut payload = self.payload_bytes();
        payload[CRC_FIELD].fill(0);
        CRC32.checksum(&payload)
    }

    pub fn is_intact(&self) -> bool {
        self.checksum() == self.crc
    }

    /// Flash byte address this page targets.
    pub fn address(&self) -> u32 {
        self.page.wrapping_mul(PAGE_SIZE as u32)
    }

    fn payload_bytes(&self) -> [u8; WRITE_PAYLOAD_SIZE] {
        let mut out = [0u8; WRITE_PAYLOAD_SIZE];
        out[..4].copy_from_slice(&self.page.to_le_bytes());
        out[4..4 + PAGE_SIZE].copy_from_slice(&self.data);
        out[CRC_FIELD].copy_from_slice(&self.crc.to_le_bytes());
        out
    }

    fn from_payload(payload: &[u8]) -> Self {
        let mut data = [0u8; PAGE_SIZE];
        data.copy_from_slice(&payload[4..4 + PAGE_SIZE]);
        Self {
            page: read_u32(payload, 0),
            data,
            crc: read_u32(payload, CRC_FIELD.start),
        }
    }
}

impl fmt::Debug for WritePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritePage")
            .field("page", &self.page)
            .field("crc", &format_args!("0x{:08x}", self.crc))
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WritePage {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "WritePage {{ page: {}, crc: 0x{:08x} }}", self.page, self.crc);
    }
}

/// Commands sent from the flasher to the bootloader.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(clippy::large_enum_variant)] // no_std, no allocator for Box
pub enum Command {
    /// Declare the total number of bytes to flash and a version tag.
    Start { length: u32, version: u16 },
    Write(WritePage),
    /// End of transfer.
    Stop,
    /// Leave update mode and re-run the boot decision.
    Boot,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Self::Start { .. } => CommandType::Start,
            Self::Write(_) => CommandType::Write,
            Self::Stop => CommandType::Stop,
            Self::Boot => CommandType::Boot,
        }
    }

    /// Serialize into exactly [`FRAME_SIZE`] bytes. Unused payload bytes are zero.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut frame = [0u8; FRAME_SIZE];
        frame[..TAG_SIZE].copy_from_slice(&(self.command_type() as u32).to_le_bytes());

        let payload = &mut frame[TAG_SIZE..];
        match self {
            Self::Start { length, version } => {
                payload[..4].copy_from_slice(&length.to_le_bytes());
                payload[4..6].copy_from_slice(&version.to_le_bytes());
            }
            Self::Write(write) => payload.copy_from_slice(&write.payload_bytes()),
            Self::Stop | Self::Boot => {}
        }
        frame
    }

    /// Interpret a complete frame. Payload bytes beyond the active variant are ignored.
    pub fn decode(frame: &[u8; FRAME_SIZE]) -> Result<Self, DecodeError> {
        let raw = read_u32(frame, 0);
        let payload = &frame[TAG_SIZE..];

        let command = match CommandType::from_u32(raw).ok_or(DecodeError::UnknownType(raw))? {
            CommandType::Start => Self::Start {
                length: read_u32(payload, 0),
                version: u16::from_le_bytes([payload[4], payload[5]]),
            },
            CommandType::Write => Self::Write(WritePage::from_payload(payload)),
            CommandType::Stop => Self::Stop,
            CommandType::Boot => Self::Boot,
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    UnknownType(u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(raw) => write!(f, "unknown command type 0x{raw:08x}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// Single byte the bootloader answers every command with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Response {
    Ack = 0x42,
    Nack = 0xFF,
}

impl Response {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x42 => Some(Self::Ack),
            0xFF => Some(Self::Nack),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Round `len` up to a whole number of pages.
pub fn padded_length(len: u32) -> u32 {
    len.div_ceil(PAGE_SIZE as u32) * PAGE_SIZE as u32
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
