// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::delay::delay_with;
use crate::regs::{Register, RegisterBus, GPIO_MODER_MODER8_0, RCC_AHBENR_IOPEEN};

pub const ALL_OFF: u32 = 0;
/// PE9, PE11, PE13, PE15: the four cardinal LEDs.
pub const BLINK_PATTERN: u32 = 0b1010_1010 << 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Off,
    Pattern,
}

impl Phase {
    pub const fn odr(self) -> u32 {
        match self {
            Phase::Off => ALL_OFF,
            Phase::Pattern => BLINK_PATTERN,
        }
    }

    pub const fn next(self) -> Phase {
        match self {
            Phase::Off => Phase::Pattern,
            Phase::Pattern => Phase::Off,
        }
    }
}

/// Ungate the GPIOE clock on the AHB bus.
pub fn enable_clock<B: RegisterBus>(bus: &mut B) {
    bus.modify(Register::RccAhbenr, |v| v | RCC_AHBENR_IOPEEN);
}

/// Put PE8..PE15 in output mode by replicating the `01` field of pin 8.
pub fn configure_outputs<B: RegisterBus>(bus: &mut B) {
    bus.write(Register::GpioeModer, GPIO_MODER_MODER8_0);
    for shift in [2, 4, 8] {
        bus.modify(Register::GpioeModer, |v| v | (v << shift));
    }
}

/// Bring up GPIOE and hand back the superloop.
///
/// Takes the bus by value: the only way to obtain a [`Blinker`] is through
/// here, so the loop never writes ODR on an unconfigured port.
pub fn init<B: RegisterBus, S: FnMut()>(mut bus: B, spin: S, delay: u32) -> Blinker<B, S> {
    enable_clock(&mut bus);
    configure_outputs(&mut bus);
    Blinker {
        bus,
        spin,
        delay,
        phase: Phase::Off,
    }
}

/// Two-state superloop alternating ODR between off and [`BLINK_PATTERN`].
#[derive(Debug)]
pub struct Blinker<B, S> {
    bus: B,
    spin: S,
    delay: u32,
    phase: Phase,
}

impl<B: RegisterBus, S: FnMut()> Blinker<B, S> {
    /// Phase the next [`step`](Self::step) will write.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// One half-period: write ODR, busy-wait, advance. Returns the phase written.
    pub fn step(&mut self) -> Phase {
        let phase = self.phase;
        self.bus.write(Register::GpioeOdr, phase.odr());
        delay_with(self.delay, &mut self.spin);
        self.phase = phase.next();
        phase
    }

    pub fn run(mut self) -> ! {
        loop {
            self.step();
        }
    }
}
