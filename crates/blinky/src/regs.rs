// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

// Base addresses (RM0316, STM32F303xB/C)
pub const RCC_BASE: u32 = 0x4002_1000;
pub const GPIOE_BASE: u32 = 0x4800_1000;

// Register offsets
pub const RCC_AHBENR_OFFSET: u32 = 0x14;
pub const GPIO_MODER_OFFSET: u32 = 0x00;
pub const GPIO_ODR_OFFSET: u32 = 0x14;

// Bit definitions
pub const RCC_AHBENR_IOPEEN: u32 = 1 << 21;
pub const GPIO_MODER_MODER8_0: u32 = 1 << 16;

/// MODER field encoding for general purpose output.
pub const MODE_OUTPUT: u32 = 0b01;

/// The registers the blinky touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    RccAhbenr,
    GpioeModer,
    GpioeOdr,
}

impl Register {
    pub const ALL: [Register; 3] = [Register::RccAhbenr, Register::GpioeModer, Register::GpioeOdr];

    pub const fn address(self) -> u32 {
        match self {
            Register::RccAhbenr => RCC_BASE + RCC_AHBENR_OFFSET,
            Register::GpioeModer => GPIOE_BASE + GPIO_MODER_OFFSET,
            Register::GpioeOdr => GPIOE_BASE + GPIO_ODR_OFFSET,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::RccAhbenr => "RCC_AHBENR",
            Register::GpioeModer => "GPIOE_MODER",
            Register::GpioeOdr => "GPIOE_ODR",
        }
    }

    pub fn from_address(address: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|reg| reg.address() == address)
    }
}

/// Word access to the peripheral registers.
///
/// Writes cannot fail: a register accepts any value, and a bad wiring shows up
/// as dark LEDs rather than as an error.
pub trait RegisterBus {
    fn read(&mut self, reg: Register) -> u32;
    fn write(&mut self, reg: Register, value: u32);

    /// Read-modify-write.
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: Register, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }
}

/// Volatile access to the on-chip registers.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Only valid on an STM32F303, and the caller must be the sole owner of
    /// RCC_AHBENR and GPIOE for the lifetime of the handle.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read(&mut self, reg: Register) -> u32 {
        // SAFETY: `Mmio` only exists on the target, where every `Register`
        // address is an aligned, always-mapped peripheral register.
        unsafe { core::ptr::read_volatile(reg.address() as usize as *const u32) }
    }

    #[inline(always)]
    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(reg.address() as usize as *mut u32, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_addresses() {
        assert_eq!(Register::RccAhbenr.address(), 0x4002_1014);
        assert_eq!(Register::GpioeModer.address(), 0x4800_1000);
        assert_eq!(Register::GpioeOdr.address(), 0x4800_1014);
    }

    #[test]
    fn test_from_address() {
        assert_eq!(Register::from_address(0x4800_1014), Some(Register::GpioeOdr));
        assert_eq!(Register::from_address(0x4800_1018), None);
    }
}
