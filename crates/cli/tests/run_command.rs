// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;

fn hello_led() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hello-led"))
}

#[test]
fn test_run_prints_each_odr_write() {
    let output = hello_led()
        .args(["run", "--half-periods", "4", "--delay", "25"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{}", stdout);
    assert!(lines[0].contains("ODR=0x0000") && lines[0].ends_with("lit=[]"));
    assert!(lines[1].contains("ODR=0xaa00") && lines[1].ends_with("lit=[n e s w]"));
    assert!(lines[3].contains("t=          75"));
}

#[test]
fn test_run_json_summary() {
    let output = hello_led()
        .args(["run", "--half-periods", "2", "--delay", "7", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["delay_ticks"], 14);
    let writes = summary["writes"].as_array().unwrap();
    // AHBENR, four MODER steps, two ODR writes.
    assert_eq!(writes.len(), 7);
    assert_eq!(writes[0]["register"], "RCC_AHBENR");
    assert_eq!(writes[4]["value"], 0x5555_0000u32);
    assert_eq!(writes[6]["register"], "GPIOE_ODR");
    assert_eq!(writes[6]["tick"], 7);
    assert!(summary["faults"].as_array().unwrap().is_empty());
}

#[test]
fn test_run_writes_vcd() {
    let dir = std::env::temp_dir().join("hello-led-run-vcd");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let vcd_path = dir.join("blink.vcd");

    let output = hello_led()
        .args(["run", "--half-periods", "4", "--delay", "100", "--vcd"])
        .arg(&vcd_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let vcd = std::fs::read_to_string(&vcd_path).unwrap();
    assert!(vcd.contains("$scope module gpioe $end"));
    assert!(vcd.contains("pe15_w"));
    assert!(vcd.contains("#100"));
    assert!(vcd.contains("#400"));
}

#[test]
fn test_run_with_chip_descriptor() {
    let chip = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/stm32f303vc.yaml");
    let output = hello_led()
        .args(["run", "--half-periods", "2", "--delay", "0", "--chip"])
        .arg(chip)
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn test_run_with_missing_chip_is_config_error() {
    let output = hello_led()
        .args(["run", "--chip", "/nonexistent/chip.yaml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
