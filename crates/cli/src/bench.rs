// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Assertion checks over a finished bench run.

use hello_led_blinky::Register;
use hello_led_config::{BenchAssertion, ExpectedPinMode};
use hello_led_core::peripherals::gpio::PinMode;
use hello_led_core::Board;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionResult {
    pub assertion: BenchAssertion,
    pub passed: bool,
}

pub fn evaluate_all(assertions: &[BenchAssertion], board: &Board) -> Vec<AssertionResult> {
    assertions
        .iter()
        .map(|assertion| {
            let passed = evaluate(assertion, board);
            if !passed {
                tracing::error!("Assertion failed: {:?}", assertion);
            }
            AssertionResult {
                assertion: assertion.clone(),
                passed,
            }
        })
        .collect()
}

pub fn evaluate(assertion: &BenchAssertion, board: &Board) -> bool {
    match assertion {
        BenchAssertion::OdrAlternates(a) => odr_alternates(board, a.odr_alternates),
        BenchAssertion::PinMode(a) => {
            let expected = match a.pin_mode.mode {
                ExpectedPinMode::Input => PinMode::Input,
                ExpectedPinMode::Output => PinMode::Output,
                ExpectedPinMode::Alternate => PinMode::Alternate,
                ExpectedPinMode::Analog => PinMode::Analog,
            };
            board
                .gpio(&a.pin_mode.port)
                .is_some_and(|port| port.mode(a.pin_mode.pin) == expected)
        }
        BenchAssertion::InitBeforeLoop(a) => init_before_loop(board) == a.init_before_loop,
        BenchAssertion::DelayTicks(a) => board.ticks() == a.delay_ticks,
    }
}

/// ODR writes hold `pair[0]`, `pair[1]`, `pair[0]`, ... and all reached the port.
///
/// Needs at least two writes so both values of the pair are seen.
fn odr_alternates(board: &Board, pair: [u32; 2]) -> bool {
    let mut count = 0usize;
    for (i, write) in board.writes_to(Register::GpioeOdr).enumerate() {
        count += 1;
        if !write.applied || write.value != pair[i % 2] {
            return false;
        }
    }
    count >= 2
}

/// One clock enable, then mode setup, then only output writes, with nothing dropped.
fn init_before_loop(board: &Board) -> bool {
    let writes = board.writes();
    let Some(first_odr) = writes
        .iter()
        .position(|w| w.register == Register::GpioeOdr)
    else {
        return false;
    };
    let (setup, looped) = writes.split_at(first_odr);

    let clock_enables = setup
        .iter()
        .filter(|w| w.register == Register::RccAhbenr)
        .count();
    let clock_first = setup
        .first()
        .is_some_and(|w| w.register == Register::RccAhbenr);
    let moder_set = setup.iter().any(|w| w.register == Register::GpioeModer);

    clock_enables == 1
        && clock_first
        && moder_set
        && setup.iter().all(|w| w.applied)
        && looped
            .iter()
            .all(|w| w.register == Register::GpioeOdr && w.applied)
}
