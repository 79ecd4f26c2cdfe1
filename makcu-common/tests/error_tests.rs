// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for the failure taxonomy and esptool output classification.

use std::path::PathBuf;

use makcu_common::error::{classify_failure, FlashError};
use makcu_common::resolver::TargetSide;

// --- classify_failure tests ---

#[test]
fn test_permission_denied_output() {
    let output = "esptool.py v4.7.0\n\
                  Serial port /dev/ttyUSB0\n\
                  A fatal error occurred: Could not open /dev/ttyUSB0, the port is busy or doesn't exist.\n\
                  ([Errno 13] could not open port /dev/ttyUSB0: [Errno 13] Permission denied: '/dev/ttyUSB0')\n";

    let err = classify_failure("/dev/ttyUSB0", Some(2), output);
    assert_eq!(
        err,
        FlashError::PermissionDenied {
            port: "/dev/ttyUSB0".to_string(),
            output: output.to_string(),
        }
    );
}

#[test]
fn test_invalid_header_is_upload_failure() {
    let output = "A fatal error occurred: Failed to connect to ESP32: Invalid head of packet (0x00): \
                  Possible serial noise or corruption.\ninvalid header: 0xffffffff\n";

    let err = classify_failure("COM3", Some(2), output);
    assert_eq!(
        err,
        FlashError::UploadFailed {
            code: Some(2),
            output: output.to_string(),
        }
    );
}

#[test]
fn test_permission_denied_distinct_from_upload_failure() {
    let denied = classify_failure("COM3", Some(1), "PermissionError(13, 'Permission denied')");
    let failed = classify_failure("COM3", Some(1), "invalid header");
    assert!(matches!(denied, FlashError::PermissionDenied { .. }));
    assert!(matches!(failed, FlashError::UploadFailed { .. }));
}

#[test]
fn test_permission_marker_is_case_sensitive() {
    let err = classify_failure("COM3", Some(1), "permission denied");
    assert!(matches!(err, FlashError::UploadFailed { .. }));
}

#[test]
fn test_missing_module_output() {
    let err = classify_failure("COM3", Some(1), "/usr/bin/python3: No module named esptool\n");
    assert_eq!(err, FlashError::MissingDependency);
}

#[test]
fn test_signal_termination() {
    let err = classify_failure("COM3", None, "");
    assert_eq!(
        err,
        FlashError::UploadFailed {
            code: None,
            output: String::new(),
        }
    );
}

// --- Display tests ---

#[test]
fn test_upload_failed_display() {
    let err = FlashError::UploadFailed {
        code: Some(2),
        output: String::new(),
    };
    assert_eq!(err.to_string(), "Firmware upload failed (exit code 2)");

    let err = FlashError::UploadFailed {
        code: None,
        output: String::new(),
    };
    assert_eq!(err.to_string(), "Firmware upload failed (terminated by signal)");
}

#[test]
fn test_no_firmware_display_lists_directories() {
    let err = FlashError::NoFirmwareFound {
        searched: vec![PathBuf::from("firmware"), PathBuf::from(".")],
    };
    assert_eq!(
        err.to_string(),
        "No firmware files found (searched: firmware, .)"
    );
}

#[test]
fn test_unresolved_target_display() {
    let err = FlashError::UnresolvedTarget {
        version: "V3.8".to_string(),
        side: TargetSide::Sub,
    };
    assert_eq!(err.to_string(), "No firmware image for version V3.8 (Sub (RIGHT))");
}

#[test]
fn test_permission_denied_display() {
    let err = FlashError::PermissionDenied {
        port: "/dev/ttyACM0".to_string(),
        output: String::new(),
    };
    assert_eq!(err.to_string(), "Permission denied while opening /dev/ttyACM0");
}

// --- help / output tests ---

#[test]
fn test_help_hints() {
    assert!(FlashError::NoDeviceFound.help().is_some());
    assert!(FlashError::MissingDependency
        .help()
        .unwrap()
        .contains("pip3 install esptool"));
    assert!(FlashError::NoFirmwareFound { searched: vec![] }
        .help()
        .unwrap()
        .contains("firmware"));
    assert!(FlashError::InvalidSelection("x".to_string()).help().is_none());
}

#[test]
fn test_output_only_for_subprocess_failures() {
    let err = classify_failure("COM3", Some(1), "boom");
    assert_eq!(err.output(), Some("boom"));
    assert_eq!(FlashError::NoDeviceFound.output(), None);
    assert_eq!(FlashError::MissingDependency.output(), None);
}
