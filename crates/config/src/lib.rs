// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";
pub const DEFAULT_DELAY_CYCLES: u32 = 500_000;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_delay_cycles() -> u32 {
    DEFAULT_DELAY_CYCLES
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeripheralKind {
    Rcc,
    Gpio,
}

/// Clock enable bit that must be set before a peripheral accepts writes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClockGateConfig {
    /// Id of the RCC peripheral holding the enable register.
    pub peripheral: String,
    pub register_offset: u64,
    pub bit: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeripheralConfig {
    pub id: String,
    pub r#type: PeripheralKind,
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub clock: Option<ClockGateConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChipDescriptor {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub peripherals: Vec<PeripheralConfig>,
}

impl ChipDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chip descriptor at {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let chip: Self = serde_yaml::from_str(yaml).context("Failed to parse Chip Descriptor YAML")?;
        chip.validate()?;
        Ok(chip)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported chip descriptor schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        for p in &self.peripherals {
            if let Some(size) = &p.size {
                parse_size(size).with_context(|| format!("Peripheral '{}' has a bad size", p.id))?;
            }
            if let Some(clock) = &p.clock {
                if clock.bit > 31 {
                    anyhow::bail!("Peripheral '{}' clock bit {} out of range", p.id, clock.bit);
                }
                let gate = self.peripherals.iter().find(|g| g.id == clock.peripheral);
                match gate {
                    Some(g) if g.r#type == PeripheralKind::Rcc => {}
                    Some(_) => anyhow::bail!(
                        "Peripheral '{}' is clocked by '{}', which is not an RCC",
                        p.id,
                        clock.peripheral
                    ),
                    None => anyhow::bail!(
                        "Peripheral '{}' is clocked by unknown peripheral '{}'",
                        p.id,
                        clock.peripheral
                    ),
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BenchInputs {
    /// Chip descriptor path, relative to the script. The built-in STM32F303 map is used when absent.
    #[serde(default)]
    pub chip: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchLimits {
    /// Number of ODR writes (each followed by one busy-wait) to run.
    pub half_periods: u64,
    #[serde(default = "default_delay_cycles")]
    pub delay_cycles: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedPinMode {
    Input,
    Output,
    Alternate,
    Analog,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PinModeDetails {
    pub port: String,
    pub pin: u8,
    pub mode: ExpectedPinMode,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PinModeAssertion {
    pub pin_mode: PinModeDetails,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OdrAlternatesAssertion {
    pub odr_alternates: [u32; 2],
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct InitBeforeLoopAssertion {
    pub init_before_loop: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DelayTicksAssertion {
    pub delay_ticks: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum BenchAssertion {
    OdrAlternates(OdrAlternatesAssertion),
    PinMode(PinModeAssertion),
    InitBeforeLoop(InitBeforeLoopAssertion),
    DelayTicks(DelayTicksAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchScript {
    pub schema_version: String,
    #[serde(default)]
    pub inputs: BenchInputs,
    pub limits: BenchLimits,
    #[serde(default)]
    pub assertions: Vec<BenchAssertion>,
}

impl BenchScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read bench script at {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: Self = serde_yaml::from_str(yaml).context("Failed to parse Bench Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        if self.limits.half_periods == 0 {
            anyhow::bail!("Limit 'half_periods' must be greater than zero");
        }

        if let Some(chip) = &self.inputs.chip {
            if chip.trim().is_empty() {
                anyhow::bail!("Input 'chip' path cannot be empty");
            }
        }

        for assertion in &self.assertions {
            if let BenchAssertion::PinMode(a) = assertion {
                if a.pin_mode.pin > 15 {
                    anyhow::bail!("pin_mode pin {} out of range 0..=15", a.pin_mode.pin);
                }
            }
        }

        if self.limits.delay_cycles == 0 {
            tracing::warn!("delay_cycles is 0; the LEDs will toggle with no visible delay");
        }

        Ok(())
    }

    /// Resolve the chip path against the directory holding the script.
    pub fn chip_path(&self, script_path: &Path) -> Option<std::path::PathBuf> {
        let chip = self.inputs.chip.as_ref()?;
        let base = script_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(chip))
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
