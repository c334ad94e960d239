// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use hello_led_config::{BenchScript, ChipDescriptor, PeripheralKind};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

#[test]
fn test_chip_descriptor_parses() {
    let yaml = r#"
name: "stm32f303vc"
peripherals:
  - id: "rcc"
    type: "rcc"
    base_address: 0x40021000
    size: "1KiB"
  - id: "gpioe"
    type: "gpio"
    base_address: 0x48001000
    size: "1KiB"
    clock: { peripheral: rcc, register_offset: 0x14, bit: 21 }
"#;
    let desc = ChipDescriptor::from_yaml(yaml).unwrap();
    assert_eq!(desc.schema_version, "1.0");
    assert_eq!(desc.peripherals.len(), 2);
    assert_eq!(desc.peripherals[1].r#type, PeripheralKind::Gpio);
    assert_eq!(desc.peripherals[1].base_address, 0x4800_1000);
    let clock = desc.peripherals[1].clock.as_ref().unwrap();
    assert_eq!(clock.register_offset, 0x14);
    assert_eq!(clock.bit, 21);
    assert!(desc.peripherals[0].clock.is_none());
}

#[test]
fn test_unknown_clock_source_rejected() {
    let yaml = r#"
name: "broken"
peripherals:
  - id: "gpioe"
    type: "gpio"
    base_address: 0x48001000
    clock: { peripheral: rcc, register_offset: 0x14, bit: 21 }
"#;
    let err = ChipDescriptor::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("unknown peripheral 'rcc'"));
}

#[test]
fn test_clock_source_must_be_rcc() {
    let yaml = r#"
name: "broken"
peripherals:
  - id: "gpiod"
    type: "gpio"
    base_address: 0x48000C00
  - id: "gpioe"
    type: "gpio"
    base_address: 0x48001000
    clock: { peripheral: gpiod, register_offset: 0x14, bit: 21 }
"#;
    let err = ChipDescriptor::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("not an RCC"));
}

#[test]
fn test_unknown_chip_schema_version_rejected() {
    let yaml = r#"
schema_version: "2.0"
name: "future"
peripherals: []
"#;
    let err = ChipDescriptor::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("Unsupported chip descriptor schema_version"));
}

#[test]
fn test_unknown_peripheral_type_rejected() {
    let yaml = r#"
name: "broken"
peripherals:
  - id: "uart1"
    type: "uart"
    base_address: 0x40013800
"#;
    assert!(ChipDescriptor::from_yaml(yaml).is_err());
}

#[test]
fn test_shipped_configs_load() {
    let configs = workspace_root().join("configs");
    let chip = ChipDescriptor::from_file(configs.join("stm32f303vc.yaml")).unwrap();
    assert_eq!(chip.name, "stm32f303vc");

    let script_path = configs.join("blink.yaml");
    let script = BenchScript::from_file(&script_path).unwrap();
    assert_eq!(
        script.chip_path(&script_path).unwrap(),
        configs.join("stm32f303vc.yaml")
    );
    assert!(!script.assertions.is_empty());
}
