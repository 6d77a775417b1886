// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-process bootloader behind a `std::io` serial port.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use samfd_common::mem_flash::MemFlash;
use samfd_common::update::dispatch_command;
use samfd_common::{
    decide, BootDecision, Command, DecodeError, Rejection, Response, Step, UpdateState, APP_OFFSET,
    FRAME_SIZE,
};

/// Runs the device side of the protocol on every complete frame it receives.
///
/// After a rejection it stops answering, like the halted bootloader. After an
/// accepted `Boot` it re-runs the boot decision and records the outcome.
pub struct SimulatedDevice {
    pub flash: MemFlash,
    state: UpdateState,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    /// Every response byte sent, in order.
    pub responses: Vec<u8>,
    /// Every decoded command, in order.
    pub received: Vec<Command>,
    pub rejection: Option<Rejection>,
    pub boot_decision: Option<BootDecision>,
    /// Flip a data bit in the n-th write frame (0-based) on its way in.
    pub corrupt_write: Option<usize>,
    writes_seen: usize,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::with_flash(MemFlash::new())
    }

    pub fn with_flash(flash: MemFlash) -> Self {
        Self {
            flash,
            state: UpdateState::Idle,
            rx: Vec::new(),
            tx: VecDeque::new(),
            responses: Vec::new(),
            received: Vec::new(),
            rejection: None,
            boot_decision: None,
            corrupt_write: None,
            writes_seen: 0,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.rejection.is_some() || matches!(self.boot_decision, Some(BootDecision::Launch(_)))
    }

    fn process(&mut self, mut frame: [u8; FRAME_SIZE]) {
        if self.is_halted() {
            return;
        }

        if frame[0] == 0x42 {
            if self.corrupt_write == Some(self.writes_seen) {
                frame[100] ^= 0x01;
            }
            self.writes_seen += 1;
        }

        let result = match Command::decode(&frame) {
            Ok(cmd) => {
                self.received.push(cmd.clone());
                dispatch_command(&mut self.flash, self.state, cmd)
            }
            Err(DecodeError::UnknownType(raw)) => Err(Rejection::UnknownCommand(raw)),
        };

        match result {
            Ok(step) => {
                self.answer(Response::Ack);
                match step {
                    Step::Continue(next) => self.state = next,
                    Step::Boot => {
                        let decision = decide(&mut self.flash, false).expect("header readable");
                        self.boot_decision = Some(decision);
                        self.state = UpdateState::Idle;
                    }
                }
            }
            Err(rejection) => {
                self.answer(Response::Nack);
                self.rejection = Some(rejection);
            }
        }
    }

    fn answer(&mut self, response: Response) {
        self.tx.push_back(response.as_byte());
        self.responses.push(response.as_byte());
    }
}

impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rx.extend_from_slice(buf);
        while self.rx.len() >= FRAME_SIZE {
            let mut frame = [0u8; FRAME_SIZE];
            frame.copy_from_slice(&self.rx[..FRAME_SIZE]);
            self.rx.drain(..FRAME_SIZE);
            self.process(frame);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.tx.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
        }
    }
}

/// Image whose first words form a bootable vector table.
pub fn bootable_image(len: usize) -> Vec<u8> {
    let mut image: Vec<u8> = (0..len).map(|i| (i % 251) as u8 + 1).collect();
    image[0..4].copy_from_slice(&0x2000_8000u32.to_le_bytes());
    image[4..8].copy_from_slice(&(APP_OFFSET + 0x41).to_le_bytes());
    image
}
