#![no_std]
// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]

use cortex_m_rt::entry;
use hello_led_blinky::{init, Mmio, BLINK_DELAY};
use panic_halt as _;

#[entry]
fn main() -> ! {
    // SAFETY: single core, no interrupts enabled, nothing else owns RCC or GPIOE.
    let bus = unsafe { Mmio::steal() };

    // Superloop we never exit from.
    init(bus, cortex_m::asm::nop, BLINK_DELAY).run()
}
