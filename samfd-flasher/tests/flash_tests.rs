// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end runs of the flashing sequence against a simulated bootloader.

mod common;

use std::io::{Cursor, Write};

use common::{bootable_image, SimulatedDevice};
use indicatif::ProgressBar;
use samfd_common::mem_flash::MemFlash;
use samfd_common::{
    BootDecision, Command, ImageHeader, Rejection, APP_CAPACITY, APP_OFFSET, PAGE_SIZE,
    START_PAGE,
};
use samfd_flasher::commands::{flash_image, FlashSummary};
use samfd_flasher::transport::Transport;

fn run(device: SimulatedDevice, image: &[u8], version: u16) -> (anyhow::Result<FlashSummary>, SimulatedDevice) {
    let mut transport = Transport::new(device, "sim");
    let result = flash_image(
        &mut transport,
        Cursor::new(image),
        image.len() as u64,
        version,
        &ProgressBar::hidden(),
    );
    (result, transport.into_inner())
}

#[test]
fn test_300_byte_image_is_padded_committed_and_booted() {
    let image = bootable_image(300);
    let (result, mut device) = run(SimulatedDevice::new(), &image, 4);

    assert_eq!(result.unwrap(), FlashSummary { length: 512, pages: 2 });
    assert_eq!(device.responses, vec![0x42; 5]);

    assert_eq!(device.received.len(), 5);
    assert_eq!(device.received[0], Command::Start { length: 512, version: 4 });

    let Command::Write(first) = &device.received[1] else {
        panic!("expected first write");
    };
    assert_eq!(first.page, START_PAGE);
    assert_eq!(&first.data[..], &image[..PAGE_SIZE]);
    assert!(first.is_intact());

    let Command::Write(second) = &device.received[2] else {
        panic!("expected second write");
    };
    assert_eq!(second.page, START_PAGE + 1);
    assert_eq!(&second.data[..44], &image[PAGE_SIZE..]);
    assert!(second.data[44..].iter().all(|&b| b == 0));
    assert!(second.is_intact());

    assert_eq!(device.received[3], Command::Stop);
    assert_eq!(device.received[4], Command::Boot);

    let header = ImageHeader::load(&mut device.flash).unwrap();
    assert!(header.valid);
    assert_eq!(header.length, 512);
    assert_eq!(header.version, 4);
    assert!(matches!(device.boot_decision, Some(BootDecision::Launch(_))));

    let flashed = &device.flash.contents()[APP_OFFSET as usize..APP_OFFSET as usize + 300];
    assert_eq!(flashed, &image[..]);
}

#[test]
fn test_page_aligned_image_needs_no_padding() {
    let image = bootable_image(3 * PAGE_SIZE);
    let (result, device) = run(SimulatedDevice::new(), &image, 0);

    assert_eq!(result.unwrap(), FlashSummary { length: 768, pages: 3 });
    assert_eq!(device.responses, vec![0x42; 6]);
}

#[test]
fn test_bad_crc_aborts_session() {
    let image = bootable_image(300);
    let mut device = SimulatedDevice::new();
    device.corrupt_write = Some(1);

    let (result, mut device) = run(device, &image, 1);

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("0xff"), "unexpected error: {err:#}");
    assert_eq!(device.responses, vec![0x42, 0x42, 0xFF]);
    assert!(matches!(device.rejection, Some(Rejection::CrcMismatch { .. })));

    // A naive host keeps talking; the halted device ignores it.
    device.write_all(&Command::Stop.encode()).unwrap();
    device.write_all(&Command::Boot.encode()).unwrap();
    assert_eq!(device.responses.len(), 3);

    let header = ImageHeader::load(&mut device.flash).unwrap();
    assert!(!header.valid);
    assert_eq!(device.boot_decision, None);
}

#[test]
fn test_start_rejection_stops_before_any_write() {
    let mut flash = MemFlash::new();
    flash.fail = true;

    let (result, device) = run(SimulatedDevice::with_flash(flash), &bootable_image(100), 0);

    assert!(result.is_err());
    assert_eq!(device.responses, vec![0xFF]);
    assert_eq!(device.received.len(), 1);
}

#[test]
fn test_oversized_image_is_refused_locally() {
    let image = vec![0u8; APP_CAPACITY as usize + 1];
    let (result, device) = run(SimulatedDevice::new(), &image, 0);

    assert!(result.is_err());
    assert!(device.received.is_empty());
}

#[test]
fn test_empty_image_is_refused_locally() {
    let (result, device) = run(SimulatedDevice::new(), &[], 0);

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("empty"), "unexpected error: {err:#}");
    assert!(device.received.is_empty());
}

#[test]
fn test_device_refuses_zero_length_start() {
    let mut device = SimulatedDevice::new();
    device
        .write_all(&Command::Start { length: 0, version: 1 }.encode())
        .unwrap();
    device.write_all(&Command::Stop.encode()).unwrap();

    assert_eq!(device.responses, vec![0xFF]);
    assert_eq!(device.rejection, Some(Rejection::EmptyImage));
    assert!(!ImageHeader::load(&mut device.flash).unwrap().valid);
}

#[test]
fn test_silent_device_is_an_error() {
    struct Mute;
    impl std::io::Read for Mute {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "Operation timed out"))
        }
    }
    impl Write for Mute {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut transport = Transport::new(Mute, "mute");
    let err = flash_image(&mut transport, Cursor::new(vec![1u8; 10]), 10, 0, &ProgressBar::hidden())
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Start"), "unexpected error: {message}");
    assert!(message.contains("timed out"), "unexpected error: {message}");
}

#[test]
fn test_invalid_response_byte_is_reported() {
    struct Garbled;
    impl std::io::Read for Garbled {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            buf[0] = 0x00;
            Ok(1)
        }
    }
    impl Write for Garbled {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut transport = Transport::new(Garbled, "garbled");
    let err = flash_image(&mut transport, Cursor::new(vec![1u8; 10]), 10, 0, &ProgressBar::hidden())
        .unwrap_err();
    assert!(format!("{err:#}").contains("invalid response 0x00"));
}

#[test]
fn test_reflash_replaces_committed_image() {
    let (result, device) = run(SimulatedDevice::new(), &bootable_image(600), 1);
    result.unwrap();

    let (result, mut device) = run(SimulatedDevice::with_flash(device.flash.power_cycle()), &bootable_image(200), 2);
    result.unwrap();

    let header = ImageHeader::load(&mut device.flash).unwrap();
    assert!(header.valid);
    assert_eq!(header.length, 256);
    assert_eq!(header.version, 2);
}
