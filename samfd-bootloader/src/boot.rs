// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

use samfd_common::{VectorTable, APP_OFFSET};

/// Hand the core over to the application. There is no way back.
///
/// # Safety
/// `vt` must come from a committed image at `APP_OFFSET`; peripherals the
/// application expects in reset state must already be released.
pub unsafe fn jump_to_application(vt: VectorTable) -> ! {
    relocate_vector_table(APP_OFFSET);
    jump_to_firmware(vt.initial_sp, vt.reset_vector);
}

unsafe fn relocate_vector_table(addr: u32) {
    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    SCB_VTOR.write_volatile(addr);

    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

unsafe fn jump_to_firmware(initial_sp: u32, reset_vector: u32) -> ! {
    core::arch::asm!(
        "msr msp, {sp}",
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}
