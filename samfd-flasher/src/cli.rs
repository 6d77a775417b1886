// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use samfd_common::BAUD_RATE;

use crate::commands;
use crate::transport::Transport;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "flasher")]
#[command(about = "Flash an application image through the SAMFD serial bootloader")]
#[command(after_help = "e.g.: flasher /dev/ttyUSB0 application.bin\n  or: flasher.exe COM1 application.bin 3")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0)
    #[arg(value_name = "PORT")]
    pub port: String,

    /// Application binary
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Application version number stored in the image header
    #[arg(value_name = "VERSION", default_value = "0")]
    pub version: u16,

    /// Serial baud rate
    #[arg(long, default_value_t = BAUD_RATE)]
    pub baud: u32,

    /// How long to wait for each response byte
    #[arg(long, value_name = "MS", default_value = "5000")]
    pub timeout_ms: u64,
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let mut transport = Transport::open(&cli.port, cli.baud, Duration::from_millis(cli.timeout_ms))?;
    commands::flash(&mut transport, &cli.file, cli.version)
}
