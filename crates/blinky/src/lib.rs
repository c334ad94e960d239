// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Blink the STM32F3 Discovery compass LEDs by poking GPIOE registers directly.
//!
//! The logic is written against [`RegisterBus`] so the same code drives the
//! real silicon through [`Mmio`] and the host register model in tests.

#![cfg_attr(not(test), no_std)]

pub mod blink;
pub mod delay;
pub mod led;
pub mod regs;

pub use blink::{configure_outputs, enable_clock, init, Blinker, Phase, ALL_OFF, BLINK_PATTERN};
pub use delay::{delay, delay_with, BLINK_DELAY};
pub use led::{leds_in, leds_mask, Led};
pub use regs::{Mmio, Register, RegisterBus};
