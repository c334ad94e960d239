// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use crate::peripherals::gpio::GpioPort;
use crate::{Bus, SimulationError};
use hello_led_blinky::{init, Register, RegisterBus};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// One 32-bit register write issued by the blink logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RegisterWrite {
    #[serde(serialize_with = "serialize_register")]
    pub register: Register,
    pub value: u32,
    /// Delay ticks elapsed before the write.
    pub tick: u64,
    /// False when the peripheral clock was off and the write was dropped.
    pub applied: bool,
}

fn serialize_register<S: serde::Serializer>(reg: &Register, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(reg.name())
}

/// Trait for observing register traffic on the board.
pub trait BoardObserver: std::fmt::Debug + Send + Sync {
    fn on_register_write(&self, _write: &RegisterWrite) {}
    fn on_finish(&self, _tick: u64) {}
}

/// Busy-wait iterations spent so far, shared with the spin closure handed to the blinker.
#[derive(Debug, Clone, Default)]
pub struct TickCounter(Rc<Cell<u64>>);

impl TickCounter {
    pub fn get(&self) -> u64 {
        self.0.get()
    }

    pub fn spinner(&self) -> impl FnMut() + 'static {
        let ticks = self.0.clone();
        move || ticks.set(ticks.get() + 1)
    }
}

/// The register model wired up as a [`RegisterBus`].
///
/// Bus faults do not stop the caller; they are logged and kept in [`Board::faults`].
#[derive(Default)]
pub struct Board {
    pub bus: SystemBus,
    ticks: TickCounter,
    writes: Vec<RegisterWrite>,
    faults: Vec<SimulationError>,
    observers: Vec<Arc<dyn BoardObserver>>,
}

impl Board {
    pub fn new(bus: SystemBus) -> Self {
        Self {
            bus,
            ..Default::default()
        }
    }

    pub fn stm32f303() -> Self {
        Self::new(SystemBus::stm32f303())
    }

    pub fn add_observer(&mut self, observer: Arc<dyn BoardObserver>) {
        self.observers.push(observer);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Spin closure that advances this board's tick counter.
    pub fn spinner(&self) -> impl FnMut() + 'static {
        self.ticks.spinner()
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    pub fn writes_to(&self, register: Register) -> impl Iterator<Item = &RegisterWrite> + '_ {
        self.writes.iter().filter(move |w| w.register == register)
    }

    pub fn faults(&self) -> &[SimulationError] {
        &self.faults
    }

    pub fn gpio(&self, name: &str) -> Option<&GpioPort> {
        self.bus.gpio(name)
    }

    pub fn snapshot(&self) -> serde_json::Value {
        self.bus.snapshot()
    }

    pub fn finish(&mut self) {
        let tick = self.ticks();
        for observer in &self.observers {
            observer.on_finish(tick);
        }
    }

    fn fault(&mut self, err: SimulationError, register: Register) {
        tracing::error!("{} ({:#x}): {}", register.name(), register.address(), err);
        self.faults.push(err);
    }
}

impl RegisterBus for Board {
    fn read(&mut self, reg: Register) -> u32 {
        match self.bus.read_u32(u64::from(reg.address())) {
            Ok(value) => value,
            Err(e) => {
                self.fault(e, reg);
                0
            }
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let addr = u64::from(reg.address());
        let applied = self.bus.is_clocked_at(addr);
        if let Err(e) = self.bus.write_u32(addr, value) {
            self.fault(e, reg);
            return;
        }

        let write = RegisterWrite {
            register: reg,
            value,
            tick: self.ticks(),
            applied,
        };
        tracing::debug!(
            "t={} {} <- {:#010x}{}",
            write.tick,
            reg.name(),
            value,
            if applied { "" } else { " (dropped)" }
        );
        for observer in &self.observers {
            observer.on_register_write(&write);
        }
        self.writes.push(write);
    }
}

/// Run `init` and then `half_periods` steps of the superloop on `board`.
pub fn run_blinky(board: Board, half_periods: u64, delay: u32) -> Board {
    let spin = board.spinner();
    let mut blinker = init(board, spin, delay);
    for _ in 0..half_periods {
        blinker.step();
    }
    let mut board = blinker.into_bus();
    board.finish();
    tracing::info!(
        "Ran {} half-periods: {} register writes, {} delay ticks",
        half_periods,
        board.writes().len(),
        board.ticks()
    );
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use hello_led_blinky::{ALL_OFF, BLINK_PATTERN};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingObserver {
        writes: Mutex<Vec<u32>>,
        finished_at: Mutex<Option<u64>>,
    }

    impl BoardObserver for CountingObserver {
        fn on_register_write(&self, write: &RegisterWrite) {
            self.writes.lock().unwrap().push(write.value);
        }

        fn on_finish(&self, tick: u64) {
            *self.finished_at.lock().unwrap() = Some(tick);
        }
    }

    #[test]
    fn test_tick_counter_shared_with_spinner() {
        let board = Board::stm32f303();
        let mut spin = board.spinner();
        spin();
        spin();
        assert_eq!(board.ticks(), 2);
    }

    #[test]
    fn test_writes_are_timestamped_in_ticks() {
        let board = run_blinky(Board::stm32f303(), 3, 10);
        let odr: Vec<_> = board
            .writes_to(Register::GpioeOdr)
            .map(|w| (w.value, w.tick))
            .collect();
        assert_eq!(odr, vec![(ALL_OFF, 0), (BLINK_PATTERN, 10), (ALL_OFF, 20)]);
        assert_eq!(board.ticks(), 30);
        assert!(board.writes().iter().all(|w| w.applied));
    }

    #[test]
    fn test_observers_see_every_write() {
        let observer = Arc::new(CountingObserver::default());
        let mut board = Board::stm32f303();
        board.add_observer(observer.clone());
        let board = run_blinky(board, 2, 5);
        assert_eq!(observer.writes.lock().unwrap().len(), board.writes().len());
        assert_eq!(*observer.finished_at.lock().unwrap(), Some(10));
    }

    #[test]
    fn test_write_without_clock_is_recorded_as_dropped() {
        let mut board = Board::stm32f303();
        board.write(Register::GpioeOdr, BLINK_PATTERN);
        let write = board.writes()[0];
        assert!(!write.applied);
        assert_eq!(board.gpio("gpioe").unwrap().odr(), 0);
    }

    #[test]
    fn test_unmapped_register_is_a_fault() {
        let mut board = Board::new(SystemBus::new());
        assert_eq!(board.read(Register::RccAhbenr), 0);
        board.write(Register::GpioeOdr, 1);
        assert_eq!(
            board.faults(),
            &[
                SimulationError::MemoryViolation(0x4002_1014),
                SimulationError::MemoryViolation(0x4800_1014)
            ]
        );
        assert!(board.writes().is_empty());
    }
}
