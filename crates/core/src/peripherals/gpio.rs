// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{extract_byte, merge_byte, SimResult};
use std::any::Any;

pub const MODER: u64 = 0x00;
pub const OTYPER: u64 = 0x04;
pub const OSPEEDR: u64 = 0x08;
pub const PUPDR: u64 = 0x0C;
pub const IDR: u64 = 0x10;
pub const ODR: u64 = 0x14;
pub const BSRR: u64 = 0x18;
pub const LCKR: u64 = 0x1C;
pub const AFRL: u64 = 0x20;
pub const AFRH: u64 = 0x24;
pub const BRR: u64 = 0x28;

/// Decoded 2-bit MODER field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    Input,
    Output,
    Alternate,
    Analog,
}

impl PinMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => PinMode::Input,
            0b01 => PinMode::Output,
            0b10 => PinMode::Alternate,
            _ => PinMode::Analog,
        }
    }
}

/// STM32F3 GPIO port (MODER/ODR/BSRR layout).
#[derive(Debug, Default, serde::Serialize)]
pub struct GpioPort {
    moder: u32,   // 0x00: mode register
    otyper: u32,  // 0x04: output type register
    ospeedr: u32, // 0x08: output speed register
    pupdr: u32,   // 0x0C: pull-up/pull-down register
    idr: u32,     // 0x10: input data register
    odr: u32,     // 0x14: output data register
    lckr: u32,    // 0x1C: configuration lock register
    afrl: u32,    // 0x20: alternate function low register
    afrh: u32,    // 0x24: alternate function high register
    #[serde(skip)]
    bsrr_buf: u32,
    #[serde(skip)]
    bsrr_mask: u8,
    #[serde(skip)]
    brr_buf: u32,
    #[serde(skip)]
    brr_mask: u8,
}

impl GpioPort {
    /// Reset state for ports C..F: every pin input, push-pull, low speed, no pull.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moder(&self) -> u32 {
        self.moder
    }

    pub fn odr(&self) -> u32 {
        self.odr
    }

    pub fn mode(&self, pin: u8) -> PinMode {
        PinMode::from_bits(self.moder >> (u32::from(pin & 0x0F) * 2))
    }

    pub fn level(&self, pin: u8) -> bool {
        self.odr & (1 << (pin & 0x0F)) != 0
    }

    fn read_reg(&self, offset: u64) -> u32 {
        match offset {
            MODER => self.moder,
            OTYPER => self.otyper,
            OSPEEDR => self.ospeedr,
            PUPDR => self.pupdr,
            IDR => self.idr,
            ODR => self.odr,
            LCKR => self.lckr,
            AFRL => self.afrl,
            AFRH => self.afrh,
            // BSRR and BRR are write-only
            _ => 0,
        }
    }

    fn write_reg(&mut self, offset: u64, value: u32) {
        match offset {
            MODER => self.moder = value,
            OTYPER => self.otyper = value & 0xFFFF,
            OSPEEDR => self.ospeedr = value,
            PUPDR => self.pupdr = value,
            ODR => self.odr = value & 0xFFFF,
            BSRR => {
                // Lower 16 bits set, upper 16 bits reset. Set wins within one word.
                let set = value & 0xFFFF;
                let reset = (value >> 16) & 0xFFFF;
                self.odr &= !reset;
                self.odr |= set;
            }
            LCKR => self.lckr = value,
            AFRL => self.afrl = value,
            AFRH => self.afrh = value,
            BRR => self.odr &= !(value & 0xFFFF),
            // IDR is read-only
            _ => {}
        }
    }

    /// BSRR/BRR act on the whole word, so bytes are buffered until a half or full word lands.
    fn handle_write_only_buffer(&mut self, reg_offset: u64, byte_offset: u32, value: u8) {
        let (buf, mask) = if reg_offset == BSRR {
            (&mut self.bsrr_buf, &mut self.bsrr_mask)
        } else {
            (&mut self.brr_buf, &mut self.brr_mask)
        };

        *buf = merge_byte(*buf, byte_offset, value);
        *mask |= 1u8 << byte_offset;

        let flushed = match *mask {
            0x0F => Some(*buf),
            0x03 => Some(*buf & 0x0000_FFFF),
            0x0C => Some(*buf & 0xFFFF_0000),
            _ => None,
        };

        if let Some(val) = flushed {
            *buf = 0;
            *mask = 0;
            self.write_reg(reg_offset, val);
        }
    }
}

impl crate::Peripheral for GpioPort {
    fn read(&self, offset: u64) -> SimResult<u8> {
        let reg_offset = offset & !3;
        let byte_offset = (offset % 4) as u32;
        Ok(extract_byte(self.read_reg(reg_offset), byte_offset))
    }

    fn write(&mut self, offset: u64, value: u8) -> SimResult<()> {
        let reg_offset = offset & !3;
        let byte_offset = (offset % 4) as u32;

        if reg_offset == BSRR || reg_offset == BRR {
            self.handle_write_only_buffer(reg_offset, byte_offset, value);
            return Ok(());
        }

        let reg_val = merge_byte(self.read_reg(reg_offset), byte_offset, value);
        self.write_reg(reg_offset, reg_val);
        Ok(())
    }

    fn write_u32(&mut self, offset: u64, value: u32) -> SimResult<()> {
        if offset == BSRR || offset == BRR {
            // Whole-word store: drop any partial byte writes and apply set and reset together.
            self.bsrr_buf = 0;
            self.bsrr_mask = 0;
            self.brr_buf = 0;
            self.brr_mask = 0;
            self.write_reg(offset, value);
            return Ok(());
        }
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write(offset + i as u64, byte)?;
        }
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::{GpioPort, PinMode};
    use crate::Peripheral;

    fn write_word(gpio: &mut GpioPort, offset: u64, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            gpio.write(offset + i as u64, byte).unwrap();
        }
    }

    #[test]
    fn test_gpio_reset_values() {
        let gpio = GpioPort::new();
        assert_eq!(gpio.moder(), 0);
        assert_eq!(gpio.odr(), 0);
        assert!((0..16).all(|pin| gpio.mode(pin) == PinMode::Input));
    }

    #[test]
    fn test_gpio_moder_decode() {
        let mut gpio = GpioPort::new();
        write_word(&mut gpio, 0x00, 0x5555_0000);
        assert!((8..16).all(|pin| gpio.mode(pin) == PinMode::Output));
        assert!((0..8).all(|pin| gpio.mode(pin) == PinMode::Input));

        write_word(&mut gpio, 0x00, 0b11_10 << 2);
        assert_eq!(gpio.mode(1), PinMode::Alternate);
        assert_eq!(gpio.mode(2), PinMode::Analog);
    }

    #[test]
    fn test_gpio_odr_write_masks_to_16_bits() {
        let mut gpio = GpioPort::new();
        write_word(&mut gpio, 0x14, 0xFFFF_AA00);
        assert_eq!(gpio.odr(), 0xAA00);
        assert!(gpio.level(9));
        assert!(!gpio.level(8));
    }

    #[test]
    fn test_gpio_bsrr_set_and_reset() {
        let mut gpio = GpioPort::new();
        write_word(&mut gpio, 0x18, 1 << 9);
        assert_eq!(gpio.odr(), 0x0200);

        write_word(&mut gpio, 0x18, 1 << (9 + 16));
        assert_eq!(gpio.odr(), 0x0000);
    }

    #[test]
    fn test_gpio_bsrr_word_set_wins_over_reset() {
        let mut gpio = GpioPort::new();
        gpio.write_u32(0x18, (1 << 9) | (1 << 25)).unwrap();
        assert_eq!(gpio.odr(), 0x0200);

        gpio.write_u32(0x18, (1 << 9) << 16).unwrap();
        assert_eq!(gpio.odr(), 0x0000);
    }

    #[test]
    fn test_gpio_brr_word_write() {
        let mut gpio = GpioPort::new();
        gpio.write_u32(0x14, 0xAA00).unwrap();
        gpio.write_u32(0x28, 0xFFFF_0000 | (1 << 13)).unwrap();
        assert_eq!(gpio.odr(), 0x8A00);
    }

    #[test]
    fn test_gpio_bsrr_half_word_flush() {
        let mut gpio = GpioPort::new();
        gpio.write(0x18, 0x00).unwrap();
        gpio.write(0x19, 0x0A).unwrap();
        assert_eq!(gpio.odr(), 0x0A00);
    }

    #[test]
    fn test_gpio_brr() {
        let mut gpio = GpioPort::new();
        write_word(&mut gpio, 0x14, 0xAA00);
        write_word(&mut gpio, 0x28, 1 << 11);
        assert_eq!(gpio.odr(), 0xA200);
        // Write-only
        assert_eq!(gpio.read(0x28).unwrap(), 0);
    }

    #[test]
    fn test_gpio_snapshot() {
        let mut gpio = GpioPort::new();
        write_word(&mut gpio, 0x14, 0xAA00);
        let snap = gpio.snapshot();
        assert_eq!(snap["odr"], 0xAA00);
        assert!(snap.get("bsrr_buf").is_none());
    }
}
