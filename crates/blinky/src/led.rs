// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The eight user LEDs (LD3..LD10) arranged as a compass rose on PE8..PE15.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Led {
    /// Clockwise from north.
    pub const ALL: [Led; 8] = [
        Led::North,
        Led::NorthEast,
        Led::East,
        Led::SouthEast,
        Led::South,
        Led::SouthWest,
        Led::West,
        Led::NorthWest,
    ];

    pub const CARDINAL: [Led; 4] = [Led::North, Led::East, Led::South, Led::West];

    /// GPIOE pin number.
    pub const fn pin(self) -> u8 {
        match self {
            Led::NorthWest => 8,
            Led::North => 9,
            Led::NorthEast => 10,
            Led::East => 11,
            Led::SouthEast => 12,
            Led::South => 13,
            Led::SouthWest => 14,
            Led::West => 15,
        }
    }

    /// ODR bit driving this LED.
    pub const fn mask(self) -> u32 {
        1 << self.pin()
    }

    /// The next LED clockwise.
    pub const fn next(self) -> Led {
        match self {
            Led::North => Led::NorthEast,
            Led::NorthEast => Led::East,
            Led::East => Led::SouthEast,
            Led::SouthEast => Led::South,
            Led::South => Led::SouthWest,
            Led::SouthWest => Led::West,
            Led::West => Led::NorthWest,
            Led::NorthWest => Led::North,
        }
    }

    pub fn from_pin(pin: u8) -> Option<Led> {
        Self::ALL.into_iter().find(|led| led.pin() == pin)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Led::North => "n",
            Led::NorthEast => "ne",
            Led::East => "e",
            Led::SouthEast => "se",
            Led::South => "s",
            Led::SouthWest => "sw",
            Led::West => "w",
            Led::NorthWest => "nw",
        }
    }
}

pub fn leds_mask(leds: &[Led]) -> u32 {
    leds.iter().fold(0, |acc, led| acc | led.mask())
}

/// LEDs lit by an ODR value, clockwise from north.
pub fn leds_in(odr: u32) -> impl Iterator<Item = Led> {
    Led::ALL.into_iter().filter(move |led| odr & led.mask() != 0)
}
