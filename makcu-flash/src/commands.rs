// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations: direct flashing and the interactive session.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::console::Term;
use dialoguer::Input;

use makcu_common::selection::{parse_chip, parse_port, parse_side, parse_version};
use makcu_common::{resolve, scan, Chip, FlashError, TargetSide};

use crate::esptool::Esptool;
use crate::ports;

const RULE_WIDTH: usize = 60;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

fn banner(title: &str) {
    println!("{}", rule('='));
    println!("  {}", title);
    println!("{}", rule('='));
}

/// Flash `firmware` to the device on `port`.
pub fn flash(esptool: &Esptool, port: &str, firmware: &Path, chip: Chip) -> Result<()> {
    println!();
    banner("MakcuFlasher - ESP32 Firmware Uploader");
    println!("Serial Port:    {}", port);
    println!("Firmware File:  {}", firmware.display());
    println!("Chip Type:      {}", chip);
    println!("{}", rule('='));
    println!();

    if !firmware.is_file() {
        return Err(FlashError::FirmwareNotFound(firmware.to_path_buf()).into());
    }

    let size = fs::metadata(firmware)
        .with_context(|| format!("Failed to read {}", firmware.display()))?
        .len();
    println!("Firmware size: {} bytes", size);
    println!();

    println!("{}", rule('*'));
    println!("  WARNING: Do not disconnect the device during");
    println!("  the firmware upload process!");
    println!("{}", rule('*'));
    println!();

    log::info!("Flashing {} to {} ({})", firmware.display(), port, chip);
    match esptool.write_flash(port, firmware, chip) {
        Ok(()) => {
            println!();
            banner("Firmware upload successful!");
            Ok(())
        }
        Err(e) => {
            println!();
            banner("Firmware upload failed!");
            Err(e.into())
        }
    }
}

/// Read one answer line from `input` after printing `prompt`.
fn ask_plain(prompt: &str, input: &mut impl BufRead) -> Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    let n = input.read_line(&mut line).context("Failed to read input")?;
    if n == 0 {
        anyhow::bail!("Input ended before \"{}\" was answered", prompt);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompt for an answer; scripted (piped) input is read line by line.
fn ask(prompt: &str) -> Result<String> {
    if !io::stdin().is_terminal() || !Term::stderr().is_term() {
        return ask_plain(prompt, &mut io::stdin().lock());
    }

    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .context("Failed to read input")
}

/// Walk the operator through port, version, side and chip selection, then flash.
pub fn interactive(
    esptool: &Esptool,
    search_dirs: &[PathBuf],
    detect_timeout: Duration,
) -> Result<()> {
    banner("MakcuFlasher - Interactive Mode");
    println!();

    // Serial port
    let ports = ports::list_ports();
    if ports.is_empty() {
        return Err(FlashError::NoDeviceFound.into());
    }

    println!("Available serial ports:");
    for (i, port) in ports.iter().enumerate() {
        println!("  {}. {}", i + 1, port);
    }
    println!();
    let answer = ask(&format!("Select port (1-{}) or enter manually", ports.len()))?;
    let port = parse_port(&answer, &ports)?;

    // Firmware version
    let catalog = scan(search_dirs);
    if catalog.is_empty() {
        return Err(FlashError::NoFirmwareFound {
            searched: search_dirs.to_vec(),
        }
        .into());
    }

    println!();
    match catalog.source() {
        Some(dir) => println!("Available firmware versions (in {}):", dir.display()),
        None => println!("Available firmware versions:"),
    }
    for (i, (version, files)) in catalog.iter().enumerate() {
        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        println!("  {}. {:<8} {}", i + 1, version, names.join(", "));
    }
    println!();
    let answer = ask(&format!("Select version (1-{}) or enter label", catalog.len()))?;
    let version = parse_version(&answer, &catalog)?;

    // Target side
    println!();
    println!("Target side:");
    for (i, side) in TargetSide::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, side);
    }
    println!();
    let side = parse_side(&ask("Select side (1-2)")?)?;

    let firmware = resolve(&catalog, &version, side)
        .ok_or_else(|| FlashError::UnresolvedTarget {
            version: version.clone(),
            side,
        })?
        .to_path_buf();
    println!("Using firmware: {}", firmware.display());

    // Chip type
    println!();
    println!("Detecting chip type on {}...", port);
    let detected = esptool.detect_chip(&port, detect_timeout);
    match detected {
        Some(chip) => println!("Detected chip: {}", chip),
        None => println!("Chip type could not be detected"),
    }
    let default_chip = detected.unwrap_or_default();

    println!();
    println!("Chip types:");
    for (i, chip) in Chip::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, chip);
    }
    println!();
    let answer = ask(&format!("Select chip [default: {}]", default_chip))?;
    let chip = parse_chip(&answer, default_chip)?;

    flash(esptool, &port, &firmware, chip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esptool::Launcher;
    use std::io::Cursor;

    fn no_esptool() -> Esptool {
        Esptool::with_launchers(vec![Launcher::program("makcu-flash-test-no-such-esptool")])
    }

    #[test]
    fn test_flash_missing_firmware_file() {
        let missing = Path::new("/nonexistent/makcu/V1.bin");
        let err = flash(&no_esptool(), "/dev/null", missing, Chip::Esp32).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FlashError>(),
            Some(&FlashError::FirmwareNotFound(missing.to_path_buf()))
        );
    }

    #[test]
    fn test_flash_directory_is_not_firmware() {
        let dir = tempfile::tempdir().unwrap();
        let err = flash(&no_esptool(), "/dev/null", dir.path(), Chip::Esp32).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FlashError>(),
            Some(FlashError::FirmwareNotFound(_))
        ));
    }

    #[test]
    fn test_flash_without_esptool_is_missing_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let firmware = dir.path().join("V3.8_LEFT.bin");
        fs::write(&firmware, [0xE9u8; 64]).unwrap();

        let err = flash(&no_esptool(), "/dev/null", &firmware, Chip::Esp32).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FlashError>(),
            Some(&FlashError::MissingDependency)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_flash_success() {
        let dir = tempfile::tempdir().unwrap();
        let firmware = dir.path().join("V3.8_LEFT.bin");
        fs::write(&firmware, [0xE9u8; 64]).unwrap();

        let esptool = Esptool::with_launchers(vec![Launcher::shell("exit 0")]);
        assert!(flash(&esptool, "/dev/ttyUSB0", &firmware, Chip::Esp32s3).is_ok());
    }

    #[test]
    fn test_ask_plain_reads_line() {
        let mut input = Cursor::new("2\r\nleft\n");
        assert_eq!(ask_plain("Select port", &mut input).unwrap(), "2");
        assert_eq!(ask_plain("Select side", &mut input).unwrap(), "left");
    }

    #[test]
    fn test_ask_plain_empty_answer() {
        let mut input = Cursor::new("\n");
        assert_eq!(ask_plain("Select chip", &mut input).unwrap(), "");
    }

    #[test]
    fn test_ask_plain_end_of_input() {
        let mut input = Cursor::new("");
        assert!(ask_plain("Select version", &mut input).is_err());
    }
}
