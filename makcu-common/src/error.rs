// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Failure taxonomy of the uploader.

use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::TargetSide;

/// Text esptool prints when the serial device cannot be opened for lack of rights.
pub const PERMISSION_DENIED_MARKER: &str = "Permission denied";

/// Text a Python launcher prints when the esptool module is not installed.
pub const MISSING_MODULE_MARKER: &str = "No module named esptool";

/// Everything that can stop a flashing run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlashError {
    #[error("No serial ports detected")]
    NoDeviceFound,

    #[error("No firmware files found (searched: {})", display_dirs(.searched))]
    NoFirmwareFound { searched: Vec<PathBuf> },

    #[error("No firmware image for version {version} ({side})")]
    UnresolvedTarget { version: String, side: TargetSide },

    #[error("Firmware file not found: {}", .0.display())]
    FirmwareNotFound(PathBuf),

    #[error("esptool not found")]
    MissingDependency,

    #[error("Permission denied while opening {port}")]
    PermissionDenied { port: String, output: String },

    #[error("Firmware upload failed{}", exit_suffix(.code))]
    UploadFailed { code: Option<i32>, output: String },

    #[error("Invalid selection: {0:?}")]
    InvalidSelection(String),
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {})", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl FlashError {
    /// Operator-facing advice for this failure, if any.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            FlashError::NoDeviceFound => Some(if cfg!(windows) {
                "Connect your Makcu device and try again."
            } else {
                "Connect your Makcu device and try again.\n\
                 Check: ls /dev/ttyUSB* /dev/ttyACM*\n\
                 You may need permissions: sudo usermod -a -G dialout $USER"
            }),
            FlashError::NoFirmwareFound { .. } => {
                Some("Place .bin files in the 'firmware' directory.")
            }
            FlashError::MissingDependency => Some(
                "Install the required dependency:\n    pip3 install esptool\n\
                 or point MAKCU_ESPTOOL at an esptool executable.",
            ),
            FlashError::PermissionDenied { .. } => Some(if cfg!(windows) {
                "Close any program using the port and try again."
            } else {
                "Add your user to the dialout group: sudo usermod -a -G dialout $USER\n\
                 then log out and log back in."
            }),
            _ => None,
        }
    }

    /// Captured esptool output attached to the failure.
    pub fn output(&self) -> Option<&str> {
        match self {
            FlashError::PermissionDenied { output, .. } | FlashError::UploadFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}

/// Turn a failed esptool run into the matching [`FlashError`].
///
/// `output` is the captured stdout and stderr of the process.
pub fn classify_failure(port: &str, code: Option<i32>, output: &str) -> FlashError {
    if output.contains(PERMISSION_DENIED_MARKER) {
        FlashError::PermissionDenied {
            port: port.to_string(),
            output: output.to_string(),
        }
    } else if output.contains(MISSING_MODULE_MARKER) {
        FlashError::MissingDependency
    } else {
        FlashError::UploadFailed {
            code,
            output: output.to_string(),
        }
    }
}
