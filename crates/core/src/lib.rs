// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod board;
pub mod bus;
pub mod peripherals;

use std::any::Any;

pub use board::{run_blinky, Board, BoardObserver, RegisterWrite, TickCounter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// A register window on the bus, accessed a byte at a time at offsets from its base.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u64) -> SimResult<u8>;
    fn write(&mut self, offset: u64, value: u8) -> SimResult<()>;

    /// Word store. Registers whose effect depends on the whole word override this.
    fn write_u32(&mut self, offset: u64, value: u32) -> SimResult<()> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write(offset + i as u64, byte)?;
        }
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Address-decoded access to every mapped peripheral.
pub trait Bus {
    fn read_u8(&self, addr: u64) -> SimResult<u8>;
    fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()>;

    /// Little-endian word read built from four byte reads.
    fn read_u32(&self, addr: u64) -> SimResult<u32> {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_u8(addr + i as u64)?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_u8(addr + i as u64, byte)?;
        }
        Ok(())
    }
}

/// Merge a byte write into a 32-bit register value.
pub(crate) fn merge_byte(reg_val: u32, byte_offset: u32, value: u8) -> u32 {
    let mask = 0xFF << (byte_offset * 8);
    (reg_val & !mask) | ((value as u32) << (byte_offset * 8))
}

pub(crate) fn extract_byte(reg_val: u32, byte_offset: u32) -> u8 {
    ((reg_val >> (byte_offset * 8)) & 0xFF) as u8
}
