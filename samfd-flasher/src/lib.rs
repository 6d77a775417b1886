// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host side of the SAMFD serial bootloader protocol.

pub mod cli;
pub mod commands;
pub mod transport;
