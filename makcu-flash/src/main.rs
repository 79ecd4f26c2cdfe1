// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware uploader for ESP32-based Makcu devices, driving esptool.
//!
//! Usage:
//!   makcu-flash                                   (interactive)
//!   makcu-flash /dev/ttyACM0 firmware/V3.8_LEFT.bin
//!   makcu-flash COM3 firmware/V3.8_RIGHT.bin esp32s3

mod cli;
mod commands;
mod esptool;
mod ports;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

fn main() -> ExitCode {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            cli::print_usage();
            return ExitCode::from(1);
        }
    };

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::report(&e);
            ExitCode::from(1)
        }
    }
}
