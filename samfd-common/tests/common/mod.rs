// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Scripted serial link for driving the dispatcher.

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_io::{ErrorKind, ErrorType, Read, Write};
use samfd_common::{Command, WritePage, PAGE_SIZE};

#[derive(Debug)]
pub struct LinkTimeout;

impl embedded_io::Error for LinkTimeout {
    fn kind(&self) -> ErrorKind {
        ErrorKind::TimedOut
    }
}

enum Chunk {
    Data(Vec<u8>),
    Gap,
}

/// Serial port fed from a script of byte chunks and gaps (read timeouts).
#[derive(Default)]
pub struct ScriptedSerial {
    rx: VecDeque<Chunk>,
    pub tx: Vec<u8>,
    /// When set, every write fails and nothing reaches `tx`.
    pub tx_broken: bool,
}

impl ScriptedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.rx.push_back(Chunk::Data(bytes.to_vec()));
        self
    }

    pub fn push_command(&mut self, cmd: &Command) -> &mut Self {
        self.push_bytes(&cmd.encode())
    }

    /// The next read times out.
    pub fn push_gap(&mut self) -> &mut Self {
        self.rx.push_back(Chunk::Gap);
        self
    }
}

impl ErrorType for ScriptedSerial {
    type Error = LinkTimeout;
}

impl Read for ScriptedSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.rx.pop_front() {
            Some(Chunk::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.rx.push_front(Chunk::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
            Some(Chunk::Gap) | None => Err(LinkTimeout),
        }
    }
}

impl Write for ScriptedSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.tx_broken {
            return Err(LinkTimeout);
        }
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Page filled with a recognisable pattern.
pub fn pattern_page(page: u32, seed: u8) -> WritePage {
    let mut data = [0u8; PAGE_SIZE];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = seed.wrapping_add(i as u8);
    }
    WritePage::new(page, data)
}
