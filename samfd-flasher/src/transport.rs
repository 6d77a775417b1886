// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport: fixed-size command frames out, single response bytes in.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use serialport::SerialPort;

use samfd_common::Command;

pub struct Transport<P = Box<dyn SerialPort>> {
    port: P,
    name: String,
}

impl Transport {
    /// Open `port` (8N1). Reads fail after `timeout` without data.
    pub fn open(port: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let serial = serialport::new(port, baud)
            .timeout(timeout)
            .open()
            .with_context(|| format!("Failed to open {port}"))?;

        Ok(Self::new(serial, port))
    }
}

impl<P: Read + Write> Transport<P> {
    pub fn new(port: P, name: &str) -> Self {
        Self {
            port,
            name: name.to_string(),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.name
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Write one complete frame.
    pub fn send(&mut self, cmd: &Command) -> Result<()> {
        self.port
            .write_all(&cmd.encode())
            .with_context(|| format!("Failed to write to {}", self.name))?;
        self.port
            .flush()
            .with_context(|| format!("Failed to flush {}", self.name))
    }

    /// Read the device's one-byte answer.
    pub fn recv(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.port
            .read_exact(&mut byte)
            .with_context(|| format!("No response from {}", self.name))?;
        Ok(byte[0])
    }
}
