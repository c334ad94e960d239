// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::gpio::GpioPort;
use crate::peripherals::rcc::{self, Rcc};
use crate::{Bus, Peripheral, SimResult, SimulationError};
use anyhow::Context;
use hello_led_config::{parse_size, ChipDescriptor, PeripheralKind};

pub const RCC_BASE: u64 = 0x4002_1000;
pub const GPIOE_BASE: u64 = 0x4800_1000;
const DEFAULT_WINDOW: u64 = 0x400;

/// Enable bit in an RCC register that a peripheral needs before it accepts writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockGate {
    pub controller: String,
    pub offset: u64,
    pub bit: u8,
}

pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub clock: Option<ClockGate>,
    pub dev: Box<dyn Peripheral>,
}

impl PeripheralEntry {
    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.base + self.size
    }
}

#[derive(Default)]
pub struct SystemBus {
    pub peripherals: Vec<PeripheralEntry>,
}

impl SystemBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// RCC and GPIOE of the STM32F303VC, GPIOE gated by AHBENR.IOPEEN.
    pub fn stm32f303() -> Self {
        let mut bus = Self::new();
        bus.add_peripheral(PeripheralEntry {
            name: "rcc".to_string(),
            base: RCC_BASE,
            size: DEFAULT_WINDOW,
            clock: None,
            dev: Box::new(Rcc::new()),
        });
        bus.add_peripheral(PeripheralEntry {
            name: "gpioe".to_string(),
            base: GPIOE_BASE,
            size: DEFAULT_WINDOW,
            clock: Some(ClockGate {
                controller: "rcc".to_string(),
                offset: rcc::AHBENR,
                bit: 21,
            }),
            dev: Box::new(GpioPort::new()),
        });
        bus
    }

    pub fn from_config(chip: &ChipDescriptor) -> anyhow::Result<Self> {
        let mut bus = Self::new();

        for p_cfg in &chip.peripherals {
            let dev: Box<dyn Peripheral> = match p_cfg.r#type {
                PeripheralKind::Gpio => Box::new(GpioPort::new()),
                PeripheralKind::Rcc => Box::new(Rcc::new()),
            };

            let size = match &p_cfg.size {
                Some(size) => parse_size(size)
                    .with_context(|| format!("Bad window size for peripheral '{}'", p_cfg.id))?,
                None => DEFAULT_WINDOW,
            };

            let clock = p_cfg.clock.as_ref().map(|c| ClockGate {
                controller: c.peripheral.clone(),
                offset: c.register_offset,
                bit: c.bit,
            });

            bus.add_peripheral(PeripheralEntry {
                name: p_cfg.id.clone(),
                base: p_cfg.base_address,
                size,
                clock,
                dev,
            });
        }

        tracing::debug!(
            "Built bus for '{}' with {} peripherals",
            chip.name,
            bus.peripherals.len()
        );
        Ok(bus)
    }

    pub fn add_peripheral(&mut self, entry: PeripheralEntry) {
        if let Some(other) = self
            .peripherals
            .iter()
            .find(|p| entry.base < p.base + p.size && p.base < entry.base + entry.size)
        {
            tracing::warn!(
                "Peripheral '{}' at {:#x} overlaps '{}' at {:#x}; first match wins",
                entry.name,
                entry.base,
                other.name,
                other.base
            );
        }
        self.peripherals.push(entry);
    }

    fn entry_at(&self, addr: u64) -> Option<&PeripheralEntry> {
        self.peripherals.iter().find(|p| p.contains(addr))
    }

    pub fn peripheral(&self, name: &str) -> Option<&dyn Peripheral> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.dev.as_ref())
    }

    pub fn gpio(&self, name: &str) -> Option<&GpioPort> {
        self.peripheral(name)?.as_any()?.downcast_ref::<GpioPort>()
    }

    pub fn rcc(&self, name: &str) -> Option<&Rcc> {
        self.peripheral(name)?.as_any()?.downcast_ref::<Rcc>()
    }

    /// Whether the peripheral mapped at `addr` has its clock running.
    ///
    /// Ungated peripherals always are. A gate naming a missing RCC counts as stopped.
    pub fn is_clocked_at(&self, addr: u64) -> bool {
        let Some(entry) = self.entry_at(addr) else {
            return true;
        };
        let Some(gate) = &entry.clock else {
            return true;
        };
        self.rcc(&gate.controller)
            .is_some_and(|rcc| rcc.is_enabled(gate.offset, gate.bit))
    }

    /// Peripheral name and offset for an address, for logs.
    pub fn describe(&self, addr: u64) -> Option<(&str, u64)> {
        self.entry_at(addr).map(|p| (p.name.as_str(), addr - p.base))
    }

    pub fn snapshot(&self) -> serde_json::Value {
        let map = self
            .peripherals
            .iter()
            .map(|p| (p.name.clone(), p.dev.snapshot()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Bus for SystemBus {
    fn read_u8(&self, addr: u64) -> SimResult<u8> {
        match self.entry_at(addr) {
            Some(p) => p.dev.read(addr - p.base),
            None => Err(SimulationError::MemoryViolation(addr)),
        }
    }

    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if !self.is_clocked_at(addr) {
            tracing::trace!("Dropped write to unclocked peripheral at {:#x}", addr);
            return Ok(());
        }
        match self.peripherals.iter_mut().find(|p| p.contains(addr)) {
            Some(p) => p.dev.write(addr - p.base, value),
            None => Err(SimulationError::MemoryViolation(addr)),
        }
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        let Some(entry) = self.entry_at(addr) else {
            return Err(SimulationError::MemoryViolation(addr));
        };
        if !entry.contains(addr + 3) {
            // Nothing is stored when the word runs past the end of its window.
            return Err(SimulationError::MemoryViolation(entry.base + entry.size));
        }
        if !self.is_clocked_at(addr) {
            // Silicon ignores writes to a peripheral whose clock is gated.
            tracing::warn!(
                "Write {:#010x} to {:#x} dropped: peripheral clock is off",
                value,
                addr
            );
            return Ok(());
        }
        match self.peripherals.iter_mut().find(|p| p.contains(addr)) {
            Some(p) => p.dev.write_u32(addr - p.base, value),
            None => Err(SimulationError::MemoryViolation(addr)),
        }
    }
}
