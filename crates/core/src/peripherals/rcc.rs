// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{extract_byte, merge_byte, SimResult};
use std::any::Any;

pub const AHBENR: u64 = 0x14;
pub const APB2ENR: u64 = 0x18;
pub const APB1ENR: u64 = 0x1C;

/// SRAMEN | FLITFEN
pub const AHBENR_RESET: u32 = 0x0000_0014;

/// Minimal STM32F3 RCC (Reset and Clock Control): the peripheral clock-enable registers.
#[derive(Debug, serde::Serialize)]
pub struct Rcc {
    ahbenr: u32,
    apb2enr: u32,
    apb1enr: u32,
}

impl Default for Rcc {
    fn default() -> Self {
        Self::new()
    }
}

impl Rcc {
    pub fn new() -> Self {
        Self {
            ahbenr: AHBENR_RESET,
            apb2enr: 0,
            apb1enr: 0,
        }
    }

    pub fn ahbenr(&self) -> u32 {
        self.ahbenr
    }

    /// Whether `bit` of the enable register at `offset` is set.
    pub fn is_enabled(&self, offset: u64, bit: u8) -> bool {
        bit < 32 && self.read_reg(offset) & (1 << bit) != 0
    }

    fn read_reg(&self, offset: u64) -> u32 {
        match offset {
            AHBENR => self.ahbenr,
            APB2ENR => self.apb2enr,
            APB1ENR => self.apb1enr,
            _ => 0,
        }
    }

    fn write_reg(&mut self, offset: u64, value: u32) {
        match offset {
            AHBENR => self.ahbenr = value,
            APB2ENR => self.apb2enr = value,
            APB1ENR => self.apb1enr = value,
            _ => {}
        }
    }
}

impl crate::Peripheral for Rcc {
    fn read(&self, offset: u64) -> SimResult<u8> {
        let reg_offset = offset & !3;
        let byte_offset = (offset % 4) as u32;
        Ok(extract_byte(self.read_reg(reg_offset), byte_offset))
    }

    fn write(&mut self, offset: u64, value: u8) -> SimResult<()> {
        let reg_offset = offset & !3;
        let byte_offset = (offset % 4) as u32;
        let reg_val = merge_byte(self.read_reg(reg_offset), byte_offset, value);
        self.write_reg(reg_offset, reg_val);
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
