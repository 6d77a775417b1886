// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! SAMFD serial bootloader: header-gated boot with a UART update mode.

#![no_std]
#![no_main]

mod boot;
mod flash;
mod peripherals;
mod uart;

use defmt_rtt as _;
use embedded_hal::digital::InputPin;
use panic_probe as _;
use samfd_common::{decide, BootDecision, Dispatcher};

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let mut p = peripherals::init();

    // Only sensed at reset; a `Boot` command re-decides from the header alone.
    let mut force_update = p.boot_pin.is_low().unwrap_or(false);

    loop {
        let decision = match decide(&mut p.flash, force_update) {
            Ok(decision) => decision,
            Err(e) => {
                defmt::error!("Header access failed: {}", e);
                halt();
            }
        };

        match decision {
            BootDecision::Launch(vt) => {
                defmt::println!("  SP:    0x{:08x}", vt.initial_sp);
                defmt::println!("  Reset: 0x{:08x}", vt.reset_vector);
                defmt::println!("Jumping to application...");

                p.uart.release();
                unsafe { boot::jump_to_application(vt) }
            }
            BootDecision::Update(reason) => {
                defmt::println!("Update mode: {}", reason);

                let mut session = Dispatcher::new(&mut p.flash, &mut p.uart);
                if let Err(rejection) = session.serve() {
                    defmt::error!("Session aborted: {}", rejection);
                    halt();
                }
                force_update = false;
            }
        }
    }
}

/// Terminal state after a rejected command; only a reset leaves it.
fn halt() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}
