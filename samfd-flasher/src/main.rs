// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use anyhow::Result;
use clap::Parser;

use samfd_flasher::cli::{self, Cli};

fn main() -> Result<()> {
    cli::run(Cli::parse())
}
