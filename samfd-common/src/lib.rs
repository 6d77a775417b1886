// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and logic for the SAMFD serial bootloader.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - `default-features = false`: `no_std` mode for the bootloader
//! - `std` feature (default): `std::error::Error` impls and a RAM-backed flash for host tools
//! - `defmt` feature: `defmt::Format` derives and logging
//!
//! Flash and serial access go through `embedded-storage` and `embedded-io`
//! traits so the update state machine runs unchanged in host tests.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod log;

pub mod boot;
pub mod header;
pub mod protocol;
pub mod storage;
pub mod update;

#[cfg(feature = "std")]
pub mod mem_flash;

// Re-export commonly used types
pub use boot::{decide, BootDecision, UpdateReason, VectorTable};
pub use header::{ImageHeader, HEADER_SIZE, IMAGE_HEADER_MAGIC};
pub use protocol::{Command, CommandType, DecodeError, Response, WritePage};
pub use protocol::{APP_CAPACITY, APP_OFFSET, BAUD_RATE, HEADER_OFFSET};
pub use protocol::{FLASH_SIZE, FRAME_SIZE, NUM_PAGES, PAGE_SIZE, START_PAGE};
pub use protocol::{NVM_PAGE_SIZE, NVM_ROW_SIZE};
pub use update::{Dispatcher, Rejection, Step, UpdateState};
