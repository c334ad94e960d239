// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use hello_led_blinky::{Led, Register};
use hello_led_core::{BoardObserver, RegisterWrite};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Mutex;
use vcd::{IdCode, TimescaleUnit, Value, Writer};

const ODR_WIDTH: u32 = 16;

/// Waveform of GPIOE output writes, one wire per LED plus the raw ODR.
///
/// Time is measured in delay ticks (busy-wait iterations), written as 1 us per tick.
pub struct VcdObserver {
    state: Mutex<VcdState>,
    odr: IdCode,
    leds: Vec<(Led, IdCode)>,
}

struct VcdState {
    writer: Writer<BufWriter<File>>,
    current_time: u64,
}

impl VcdState {
    fn advance_to(&mut self, tick: u64) -> std::io::Result<()> {
        if tick > self.current_time {
            self.current_time = tick;
            self.writer.timestamp(tick)?;
        }
        Ok(())
    }
}

impl VcdObserver {
    pub fn new(path: std::path::PathBuf) -> anyhow::Result<Self> {
        let file = File::create(path)?;
        let buf = BufWriter::new(file);
        let mut writer = Writer::new(buf);

        writer.timescale(1, TimescaleUnit::US)?;
        writer.add_module("gpioe")?;
        let odr = writer.add_wire(ODR_WIDTH, "odr")?;
        let mut leds = Vec::with_capacity(Led::ALL.len());
        for led in Led::ALL {
            let id = writer.add_wire(1, &format!("pe{}_{}", led.pin(), led.name()))?;
            leds.push((led, id));
        }
        writer.upscope()?;
        writer.enddefinitions()?;

        writer.timestamp(0)?;
        writer.change_vector(odr, u64_to_vec(0, ODR_WIDTH))?;
        for (_, id) in &leds {
            writer.change_scalar(*id, Value::V0)?;
        }

        Ok(Self {
            state: Mutex::new(VcdState {
                writer,
                current_time: 0,
            }),
            odr,
            leds,
        })
    }

    fn record_odr(&self, tick: u64, value: u32) -> std::io::Result<()> {
        let Ok(mut state) = self.state.lock() else {
            return Ok(());
        };
        state.advance_to(tick)?;
        state
            .writer
            .change_vector(self.odr, u64_to_vec(u64::from(value), ODR_WIDTH))?;
        for (led, id) in &self.leds {
            let level = if value & led.mask() != 0 {
                Value::V1
            } else {
                Value::V0
            };
            state.writer.change_scalar(*id, level)?;
        }
        Ok(())
    }
}

// MSB first
fn u64_to_vec(val: u64, width: u32) -> Vec<Value> {
    let mut bits = Vec::with_capacity(width as usize);
    for i in (0..width).rev() {
        let bit = (val >> i) & 1;
        bits.push(if bit == 1 { Value::V1 } else { Value::V0 });
    }
    bits
}

impl core::fmt::Debug for VcdObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "VcdObserver")
    }
}

impl BoardObserver for VcdObserver {
    fn on_register_write(&self, write: &RegisterWrite) {
        if write.register != Register::GpioeOdr || !write.applied {
            return;
        }
        if let Err(e) = self.record_odr(write.tick, write.value) {
            tracing::warn!("Failed to write VCD sample: {}", e);
        }
    }

    fn on_finish(&self, tick: u64) {
        if let Ok(mut state) = self.state.lock() {
            if let Err(e) = state.advance_to(tick) {
                tracing::warn!("Failed to close VCD trace: {}", e);
            }
        }
    }
}
