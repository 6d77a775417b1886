// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The flashing sequence: start, one write per page, stop, boot.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use samfd_common::protocol::padded_length;
use samfd_common::{Command, Response, WritePage, APP_CAPACITY, PAGE_SIZE, START_PAGE};

use crate::transport::Transport;

/// What a successful run sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashSummary {
    pub length: u32,
    pub pages: u32,
}

/// Flash the image at `file` and boot it.
pub fn flash<P: Read + Write>(transport: &mut Transport<P>, file: &Path, version: u16) -> Result<()> {
    let image = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let image_len = image
        .metadata()
        .with_context(|| format!("Failed to stat {}", file.display()))?
        .len();

    println!(
        "Image:   {} ({} bytes, version {})",
        file.display(),
        image_len,
        version
    );
    println!("Port:    {}", transport.port_name());

    let pb = ProgressBar::with_draw_target(
        Some(image_len.div_ceil(PAGE_SIZE as u64)),
        ProgressDrawTarget::stdout(),
    );
    pb.set_style(
        ProgressStyle::with_template("flashing [{bar:40}] {pos}/{len} pages")?
            .progress_chars(". "),
    );

    let result = flash_image(transport, image, image_len, version, &pb);
    match &result {
        Ok(summary) => {
            pb.finish();
            println!(
                "Done: {} pages ({} bytes) flashed, application booted.",
                summary.pages, summary.length
            );
        }
        Err(_) => pb.abandon(),
    }
    result.map(|_| ())
}

/// Drive the whole protocol for an image of `image_len` bytes read from `image`.
///
/// The last page is zero padded. Any non-ack answer aborts the run; the device
/// is left wherever it stopped and the only recovery is to start over.
pub fn flash_image<P: Read + Write, R: Read>(
    transport: &mut Transport<P>,
    mut image: R,
    image_len: u64,
    version: u16,
    progress: &ProgressBar,
) -> Result<FlashSummary> {
    ensure!(image_len > 0, "Image is empty");
    ensure!(
        image_len <= u64::from(APP_CAPACITY),
        "Image is {} bytes, the application region holds {}",
        image_len,
        APP_CAPACITY
    );
    let length = padded_length(image_len as u32);
    let pages = length / PAGE_SIZE as u32;

    transport.send(&Command::Start { length, version })?;
    expect_ack(transport, "Start")?;

    for i in 0..pages {
        let page = START_PAGE + i;
        let mut data = [0u8; PAGE_SIZE];
        let n = read_page(&mut image, &mut data)
            .with_context(|| format!("Failed to read image page {i}"))?;
        if n == 0 {
            bail!("Image ended early at page {i} of {pages}");
        }

        transport.send(&Command::Write(WritePage::new(page, data)))?;
        expect_ack(transport, &format!("Write page {page}"))?;
        progress.inc(1);
    }

    transport.send(&Command::Stop)?;
    expect_ack(transport, "Stop")?;

    transport.send(&Command::Boot)?;
    expect_ack(transport, "Boot")?;

    Ok(FlashSummary { length, pages })
}

/// Fill `buf` as far as the image allows. Returns the byte count; the tail keeps its zeros.
fn read_page<R: Read>(image: &mut R, buf: &mut [u8; PAGE_SIZE]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match image.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn expect_ack<P: Read + Write>(transport: &mut Transport<P>, step: &str) -> Result<()> {
    let byte = transport
        .recv()
        .with_context(|| format!("{step}: no answer"))?;

    match Response::from_byte(byte) {
        Some(Response::Ack) => Ok(()),
        Some(Response::Nack) => bail!("{step} rejected by the bootloader (response 0x{byte:02x})"),
        None => bail!("{step}: invalid response 0x{byte:02x}"),
    }
}
