// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware update state machine over a serial link.
//!
//! This module implements the update protocol:
//! - `Start`: Invalidate the header and declare the image length
//! - `Write`: Program one CRC-protected page into the application region
//! - `Stop`: Check the written length and commit the header
//! - `Boot`: Leave update mode and re-run the boot decision
//!
//! Any rejected command is answered with `0xFF` and ends the session.
mod commands;
mod dispatcher;
mod state;

pub use commands::dispatch_command;
pub use dispatcher::{read_frame, Dispatcher};
pub use state::{FlashFault, Rejection, Step, UpdateState};
