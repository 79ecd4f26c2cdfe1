// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use makcu_common::{Chip, FlashError, DEFAULT_SEARCH_DIRS};

use crate::commands;
use crate::esptool::{Esptool, DEFAULT_DETECT_TIMEOUT_SECS};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "makcu-flash", version)]
#[command(about = "Firmware uploader for ESP32-based Makcu devices")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyACM0 or COM3); omit for interactive mode
    #[arg(value_name = "PORT")]
    pub port: Option<String>,

    /// Firmware binary file
    #[arg(value_name = "FIRMWARE_FILE")]
    pub firmware: Option<PathBuf>,

    /// Chip type: esp32, esp32s3, esp32c3 or esp32s2 [default: esp32]
    #[arg(value_name = "CHIP", value_parser = parse_chip_arg)]
    pub chip: Option<Chip>,

    /// Directory to search for firmware images (repeatable, replaces the defaults)
    #[arg(short = 'd', long = "firmware-dir", value_name = "DIR", env = "MAKCU_FIRMWARE_DIR")]
    pub firmware_dirs: Vec<PathBuf>,

    /// esptool program to run instead of searching for one
    #[arg(long, value_name = "PROGRAM", env = "MAKCU_ESPTOOL")]
    pub esptool: Option<String>,

    /// Seconds to wait for chip detection in interactive mode
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_DETECT_TIMEOUT_SECS)]
    pub detect_timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the positional arguments ask for.
#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Direct {
        port: String,
        firmware: PathBuf,
        chip: Chip,
    },
}

fn parse_chip_arg(s: &str) -> Result<Chip, String> {
    s.parse()
        .map_err(|_| format!("unsupported chip (expected one of {})", Chip::tags().join(", ")))
}

impl Cli {
    /// Mode selected by the positional arguments, or `None` for an invalid count.
    pub fn mode(&self) -> Option<Mode> {
        match (&self.port, &self.firmware) {
            (None, None) => Some(Mode::Interactive),
            (Some(port), Some(firmware)) => Some(Mode::Direct {
                port: port.clone(),
                firmware: firmware.clone(),
                chip: self.chip.unwrap_or_default(),
            }),
            _ => None,
        }
    }

    /// Firmware directories to scan, in priority order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        if self.firmware_dirs.is_empty() {
            DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from).collect()
        } else {
            self.firmware_dirs.clone()
        }
    }
}

/// Print the usage summary shown for invalid invocations.
pub fn print_usage() {
    let (port, firmware) = if cfg!(windows) {
        ("COM3", "firmware\\V3.8_LEFT.bin")
    } else {
        ("/dev/ttyACM0", "firmware/V3.8_LEFT.bin")
    };

    println!("MakcuFlasher - ESP32-based Makcu firmware uploader");
    println!();
    println!("Usage:");
    println!("  Interactive mode: makcu-flash");
    println!("  Manual mode:      makcu-flash <PORT> <FIRMWARE_FILE> [CHIP]");
    println!();
    println!("Examples:");
    println!("  makcu-flash {} {}", port, firmware);
    println!("  makcu-flash {} {} esp32s3", port, firmware);
    println!();
    println!("Run 'makcu-flash --help' for all options.");
}

/// Print a failure and any hint attached to it.
pub fn report(err: &anyhow::Error) {
    eprintln!("[ERROR] {:#}", err);

    if let Some(flash_err) = err.downcast_ref::<FlashError>() {
        if let Some(output) = flash_err.output() {
            let output = output.trim_end();
            if !output.is_empty() {
                eprintln!();
                eprintln!("esptool output:");
                eprintln!("{}", output);
            }
        }
        if let Some(help) = flash_err.help() {
            eprintln!();
            eprintln!("{}", help);
        }
    }
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let esptool = Esptool::new(cli.esptool.as_deref());

    match cli.mode() {
        Some(Mode::Direct {
            port,
            firmware,
            chip,
        }) => commands::flash(&esptool, &port, &firmware, chip),
        Some(Mode::Interactive) => commands::interactive(
            &esptool,
            &cli.search_dirs(),
            Duration::from_secs(cli.detect_timeout),
        ),
        None => {
            print_usage();
            anyhow::bail!("Expected either no arguments or <PORT> <FIRMWARE_FILE> [CHIP]")
        }
    }
}
