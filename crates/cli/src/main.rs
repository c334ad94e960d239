// hello-led - STM32F3 Discovery register-level blinky
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod bench;
mod vcd_trace;

use clap::{Parser, Subcommand};
use hello_led_blinky::{leds_in, Register};
use hello_led_config::{BenchScript, ChipDescriptor, DEFAULT_DELAY_CYCLES};
use hello_led_core::bus::SystemBus;
use hello_led_core::{run_blinky, Board, RegisterWrite};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use bench::AssertionResult;
use vcd_trace::VcdObserver;

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Runs the STM32F3 Discovery blinky against a host register model",
    long_about = None
)]
struct Cli {
    /// Log every register write
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the blink loop for a fixed number of half-periods and print the ODR writes.
    Run(RunArgs),

    /// Deterministic, CI-friendly runner mode driven by a bench script (YAML).
    Test(TestArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to a chip descriptor (YAML). Defaults to the built-in STM32F303 map.
    #[arg(long)]
    chip: Option<PathBuf>,

    /// Number of ODR writes to run after init
    #[arg(long, default_value = "8")]
    half_periods: u64,

    /// Busy-wait iterations per half-period
    #[arg(long, default_value_t = DEFAULT_DELAY_CYCLES)]
    delay: u32,

    /// Write a VCD waveform of the LED pins
    #[arg(long)]
    vcd: Option<PathBuf>,

    /// Print a JSON summary instead of one line per write
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct TestArgs {
    /// Path to the bench script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Override half_periods (takes precedence over script)
    #[arg(long)]
    half_periods: Option<u64>,

    /// Directory to write test artifacts (result.json)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write a VCD waveform of the LED pins
    #[arg(long)]
    vcd: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    half_periods: u64,
    delay_cycles: u32,
    delay_ticks: u64,
    writes: Vec<RegisterWrite>,
    faults: Vec<String>,
    registers: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct TestResult {
    result_schema_version: String,
    status: String,
    half_periods: u64,
    delay_cycles: u32,
    delay_ticks: u64,
    register_writes: usize,
    odr: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    assertions: Vec<AssertionResult>,
    faults: Vec<String>,
    registers: serde_json::Value,
    config: TestConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct TestConfig {
    script: PathBuf,
    chip: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `run --json` output stays parseable.
    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Test(args) => run_test(args),
    }
}

fn build_board(chip_path: Option<&Path>) -> anyhow::Result<Board> {
    let bus = match chip_path {
        Some(path) => {
            info!("Loading chip descriptor: {:?}", path);
            let chip = ChipDescriptor::from_file(path)?;
            SystemBus::from_config(&chip)?
        }
        None => {
            info!("Using built-in STM32F303 register map");
            SystemBus::stm32f303()
        }
    };
    Ok(Board::new(bus))
}

fn attach_vcd(board: &mut Board, path: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = path {
        info!("Writing VCD trace to {:?}", path);
        board.add_observer(Arc::new(VcdObserver::new(path.clone())?));
    }
    Ok(())
}

fn fault_strings(board: &Board) -> Vec<String> {
    board.faults().iter().map(|e| e.to_string()).collect()
}

fn run(args: RunArgs) -> ExitCode {
    let mut board = match build_board(args.chip.as_deref()) {
        Ok(board) => board,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if let Err(e) = attach_vcd(&mut board, args.vcd.as_ref()) {
        error!("{:#}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let board = run_blinky(board, args.half_periods, args.delay);

    if args.json {
        let summary = RunSummary {
            half_periods: args.half_periods,
            delay_cycles: args.delay,
            delay_ticks: board.ticks(),
            writes: board.writes().to_vec(),
            faults: fault_strings(&board),
            registers: board.snapshot(),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize run summary: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    } else {
        for write in board.writes_to(Register::GpioeOdr) {
            let lit: Vec<&str> = leds_in(write.value).map(|led| led.name()).collect();
            println!(
                "t={:>12} ODR={:#06x} lit=[{}]",
                write.tick,
                write.value,
                lit.join(" ")
            );
        }
    }

    if board.faults().is_empty() {
        ExitCode::from(EXIT_PASS)
    } else {
        error!("{} bus faults during run", board.faults().len());
        ExitCode::from(EXIT_RUNTIME_ERROR)
    }
}

fn run_test(args: TestArgs) -> ExitCode {
    let script = match BenchScript::from_file(&args.script) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("{:#}", e);
            error!("{}", msg);
            write_config_error_outputs(&args, None, msg);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if args.half_periods == Some(0) {
        let msg = "--half-periods must be greater than zero".to_string();
        error!("{}", msg);
        write_config_error_outputs(&args, None, msg);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let chip_path = script.chip_path(&args.script);
    let mut board = match build_board(chip_path.as_deref()) {
        Ok(board) => board,
        Err(e) => {
            let msg = format!("{:#}", e);
            error!("{}", msg);
            write_config_error_outputs(&args, chip_path.as_ref(), msg);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if let Err(e) = attach_vcd(&mut board, args.vcd.as_ref()) {
        let msg = format!("{:#}", e);
        error!("{}", msg);
        write_config_error_outputs(&args, chip_path.as_ref(), msg);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let half_periods = args.half_periods.unwrap_or(script.limits.half_periods);
    let delay_cycles = script.limits.delay_cycles;
    let board = run_blinky(board, half_periods, delay_cycles);

    let assertions = bench::evaluate_all(&script.assertions, &board);
    let all_passed = assertions.iter().all(|a| a.passed);
    let faulted = !board.faults().is_empty();

    let (status, code) = if !all_passed {
        ("fail", EXIT_ASSERT_FAIL)
    } else if faulted {
        ("error", EXIT_RUNTIME_ERROR)
    } else {
        ("pass", EXIT_PASS)
    };
    info!(
        "Bench {}: {}/{} assertions passed",
        status,
        assertions.iter().filter(|a| a.passed).count(),
        assertions.len()
    );

    let result = TestResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        half_periods,
        delay_cycles,
        delay_ticks: board.ticks(),
        register_writes: board.writes().len(),
        odr: board
            .writes_to(Register::GpioeOdr)
            .map(|w| w.value)
            .collect(),
        message: faulted.then(|| format!("{} bus faults during run", board.faults().len())),
        assertions,
        faults: fault_strings(&board),
        registers: board.snapshot(),
        config: TestConfig {
            script: args.script.clone(),
            chip: chip_path,
        },
    };
    write_result(&args, &result);

    ExitCode::from(code)
}

fn write_result(args: &TestArgs, result: &TestResult) {
    let Some(output_dir) = &args.output_dir else {
        return;
    };
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        error!("Failed to create output directory {:?}: {}", output_dir, e);
        return;
    }
    let result_path = output_dir.join("result.json");
    match std::fs::File::create(&result_path) {
        Ok(f) => {
            if let Err(e) = serde_json::to_writer_pretty(f, result) {
                error!("Failed to write result.json: {}", e);
            }
        }
        Err(e) => error!("Failed to create result.json: {}", e),
    }
}

fn write_config_error_outputs(args: &TestArgs, chip_path: Option<&PathBuf>, message: String) {
    let result = TestResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: "error".to_string(),
        half_periods: args.half_periods.unwrap_or(0),
        delay_cycles: 0,
        delay_ticks: 0,
        register_writes: 0,
        odr: Vec::new(),
        message: Some(message),
        assertions: Vec::new(),
        faults: Vec::new(),
        registers: serde_json::Value::Null,
        config: TestConfig {
            script: args.script.clone(),
            chip: chip_path.cloned(),
        },
    };
    write_result(args, &result);
}
