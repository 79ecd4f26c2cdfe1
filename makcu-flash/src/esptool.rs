// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! esptool subprocess layer.
//!
//! The actual flashing (bootloader sync, compressed writes, verification) is
//! done by esptool. This module finds a working way to launch it, runs it with
//! fixed flash parameters and turns its exit status and output into a
//! [`FlashError`].

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use makcu_common::error::MISSING_MODULE_MARKER;
use makcu_common::{classify_failure, Chip, FlashError};

/// Serial speed used while flashing.
pub const BAUD_RATE: u32 = 460_800;

/// Flash offset the image is written to.
pub const FLASH_ADDRESS: &str = "0x0";

/// Default time allowed for chip identification.
pub const DEFAULT_DETECT_TIMEOUT_SECS: u64 = 10;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One way of starting esptool: a program plus leading arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Launcher {
    program: String,
    prefix: Vec<String>,
}

impl Launcher {
    /// Run `program` directly.
    pub fn program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    /// Run esptool as a module of the given Python interpreter.
    pub fn python_module(python: impl Into<String>) -> Self {
        Self {
            program: python.into(),
            prefix: vec!["-m".to_string(), "esptool".to_string()],
        }
    }

    /// Run `script` with `sh -c`, standing in for esptool in tests.
    #[cfg(all(test, unix))]
    pub(crate) fn shell(script: &str) -> Self {
        Self {
            program: "sh".to_string(),
            prefix: vec!["-c".to_string(), script.to_string(), "esptool".to_string()],
        }
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix).args(args).stdin(Stdio::null());
        cmd
    }
}

impl std::fmt::Display for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.prefix {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Launchers to try, in order. An explicit program replaces the defaults.
pub fn candidates(program: Option<&str>) -> Vec<Launcher> {
    if let Some(program) = program {
        return vec![Launcher::program(program)];
    }

    let python = if cfg!(windows) { "python" } else { "python3" };
    vec![
        Launcher::program("esptool.py"),
        Launcher::program("esptool"),
        Launcher::python_module(python),
    ]
}

/// Arguments for writing `firmware` at [`FLASH_ADDRESS`].
pub fn write_flash_args(port: &str, firmware: &Path, chip: Chip) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--chip",
        chip.tag(),
        "--port",
        port,
        "--baud",
        &BAUD_RATE.to_string(),
        "--before",
        "default_reset",
        "--after",
        "hard_reset",
        "write_flash",
        "-z",
        "--flash_mode",
        "dio",
        "--flash_freq",
        "40m",
        "--flash_size",
        "detect",
        FLASH_ADDRESS,
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(firmware.as_os_str().to_os_string());
    args
}

/// Arguments for reading the chip identification.
pub fn chip_id_args(port: &str) -> Vec<OsString> {
    ["--port", port, "chip_id"]
        .iter()
        .map(OsString::from)
        .collect()
}

/// Extract the chip type from esptool's identification output.
///
/// Recognizes `Chip is ESP32-S3 (...)`, `Chip type: ESP32-S3 (...)` and
/// `Detecting chip type... ESP32-S3`.
pub fn parse_chip_output(output: &str) -> Option<Chip> {
    const MARKERS: [&str; 3] = ["Chip is ", "Chip type:", "Detecting chip type..."];

    output.lines().find_map(|line| {
        MARKERS.iter().find_map(|marker| {
            let (_, rest) = line.split_once(marker)?;
            Chip::from_description(rest)
        })
    })
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}

/// Run `cmd` to completion with captured output while a spinner ticks.
fn run_with_spinner(cmd: &mut Command, message: &str) -> io::Result<Output> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = cmd.output();
    pb.finish_and_clear();
    result
}

/// Read `pipe` to the end on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Run `cmd` with captured output, killing it after `timeout`.
///
/// Both pipes are drained while waiting so a chatty child never blocks on a
/// full pipe. Returns `Ok(None)` when the deadline passed.
fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Option<Output>> {
    let mut child = cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + timeout;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            log::debug!("Process {} timed out after {:?}, killing", child.id(), timeout);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Some(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    }))
}

/// Handle on the external esptool utility.
#[derive(Clone, Debug)]
pub struct Esptool {
    launchers: Vec<Launcher>,
}

impl Esptool {
    /// Use the default launchers, or only `program` when given.
    pub fn new(program: Option<&str>) -> Self {
        Self::with_launchers(candidates(program))
    }

    pub fn with_launchers(launchers: Vec<Launcher>) -> Self {
        Self { launchers }
    }

    /// Write `firmware` to the device on `port`.
    pub fn write_flash(&self, port: &str, firmware: &Path, chip: Chip) -> Result<(), FlashError> {
        let args = write_flash_args(port, firmware, chip);

        for launcher in &self.launchers {
            let mut cmd = launcher.command(&args);
            log::debug!("Running: {:?}", cmd);

            let output = match run_with_spinner(&mut cmd, "Uploading firmware...") {
                Ok(output) => output,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} not available", launcher);
                    continue;
                }
                Err(e) => {
                    return Err(FlashError::UploadFailed {
                        code: None,
                        output: format!("Failed to run {}: {}", launcher, e),
                    })
                }
            };

            let text = combined_output(&output);
            if output.status.success() {
                log::debug!("esptool output:\n{}", text);
                return Ok(());
            }
            if text.contains(MISSING_MODULE_MARKER) {
                log::debug!("{} has no esptool module", launcher);
                continue;
            }
            return Err(classify_failure(port, output.status.code(), &text));
        }

        Err(FlashError::MissingDependency)
    }

    /// Ask esptool which chip is attached to `port`.
    ///
    /// Any failure, including a timeout, yields `None`.
    pub fn detect_chip(&self, port: &str, timeout: Duration) -> Option<Chip> {
        let args = chip_id_args(port);

        for launcher in &self.launchers {
            let mut cmd = launcher.command(&args);
            log::debug!("Running: {:?}", cmd);

            match run_with_timeout(&mut cmd, timeout) {
                Ok(Some(output)) => {
                    let text = combined_output(&output);
                    if text.contains(MISSING_MODULE_MARKER) {
                        continue;
                    }
                    let chip = parse_chip_output(&text);
                    if chip.is_none() {
                        log::debug!("Could not identify chip:\n{}", text);
                    }
                    return chip;
                }
                Ok(None) => {
                    log::warn!("Chip detection timed out after {}s", timeout.as_secs());
                    return None;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    log::debug!("Chip detection failed: {}", e);
                    return None;
                }
            }
        }

        None
    }
}
