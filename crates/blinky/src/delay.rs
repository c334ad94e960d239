// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Iterations per half-period. Not calibrated against any clock.
pub const BLINK_DELAY: u32 = 500_000;

/// Busy-wait for `count` iterations.
pub fn delay(count: u32) {
    delay_with(count, &mut core::hint::spin_loop);
}

/// Busy-wait for `count` iterations, calling `spin` once per decrement.
///
/// `spin` keeps the loop from being optimised away; on target it is a `nop`.
pub fn delay_with<S: FnMut() + ?Sized>(mut count: u32, spin: &mut S) {
    while count != 0 {
        count -= 1;
        spin();
    }
}
