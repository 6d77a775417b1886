// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use embedded_io::{Read, Write};
use embedded_storage::nor_flash::NorFlash;

use super::commands::dispatch_command;
use super::state::{Rejection, Step, UpdateState};
use crate::protocol::{Command, DecodeError, Response, FRAME_SIZE};

/// Read exactly one frame.
///
/// A short read (timeout, end of stream, transport error) drops whatever was
/// received and returns `None`; the caller simply waits for the next frame.
pub fn read_frame<S: Read>(serial: &mut S) -> Option<[u8; FRAME_SIZE]> {
    let mut frame = [0u8; FRAME_SIZE];
    serial.read_exact(&mut frame).ok()?;
    Some(frame)
}

/// One update-mode session: the state flag plus the flash and serial it drives.
pub struct Dispatcher<'a, F, S> {
    flash: &'a mut F,
    serial: &'a mut S,
    state: UpdateState,
}

impl<'a, F, S> Dispatcher<'a, F, S>
where
    F: NorFlash,
    S: Read + Write,
{
    pub fn new(flash: &'a mut F, serial: &'a mut S) -> Self {
        Self {
            flash,
            serial,
            state: UpdateState::Idle,
        }
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Run the command loop until `Boot` is accepted.
    ///
    /// Returns the rejection that ended the session otherwise; the `0xFF`
    /// answer has already been sent at that point.
    pub fn serve(&mut self) -> Result<(), Rejection> {
        loop {
            let Some(frame) = read_frame(self.serial) else {
                continue;
            };

            if let Step::Boot = self.process_frame(&frame)? {
                return Ok(());
            }
        }
    }

    /// Decode, dispatch and answer one complete frame.
    pub fn process_frame(&mut self, frame: &[u8; FRAME_SIZE]) -> Result<Step, Rejection> {
        let result = match Command::decode(frame) {
            Ok(cmd) => dispatch_command(self.flash, self.state, cmd),
            Err(DecodeError::UnknownType(raw)) => {
                warn!("Dispatcher: unknown command type 0x{:08x}", raw);
                Err(Rejection::UnknownCommand(raw))
            }
        };

        match result {
            Ok(step) => {
                if let Step::Continue(next) = step {
                    self.state = next;
                }
                self.respond(Response::Ack);
                Ok(step)
            }
            Err(rejection) => {
                self.respond(Response::Nack);
                Err(rejection)
            }
        }
    }

    /// Send the answer byte. A failed send is logged; the host sees a timeout.
    fn respond(&mut self, response: Response) {
        let byte = response.as_byte();
        if self.serial.write_all(&[byte]).is_err() {
            warn!("Dispatcher: failed to send response 0x{:02x}", byte);
        } else if self.serial.flush().is_err() {
            warn!("Dispatcher: failed to flush response 0x{:02x}", byte);
        }
    }
}
