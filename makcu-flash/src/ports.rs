// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial port discovery.

use serialport::{available_ports, SerialPortInfo, SerialPortType};

/// Device name prefixes of USB serial adapters on Linux.
const USB_TTY_PREFIXES: &[&str] = &["ttyUSB", "ttyACM"];

/// Whether `name` looks like a USB serial device node (`/dev/ttyUSB0`, `/dev/ttyACM1`, ...).
pub fn is_usb_tty_name(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    USB_TTY_PREFIXES.iter().any(|prefix| base.starts_with(prefix))
}

fn is_candidate(info: &SerialPortInfo) -> bool {
    match info.port_type {
        SerialPortType::UsbPort(_) => true,
        _ => cfg!(windows) || is_usb_tty_name(&info.port_name),
    }
}

/// List serial ports a Makcu device may be attached to, sorted by name.
///
/// Returns an empty list when enumeration is not supported or fails.
pub fn list_ports() -> Vec<String> {
    let ports = match available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            log::debug!("Serial port enumeration failed: {}", e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = ports
        .into_iter()
        .filter(is_candidate)
        .map(|info| info.port_name)
        .collect();
    names.sort();
    names.dedup();

    log::debug!("Detected serial ports: {:?}", names);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_tty_names() {
        assert!(is_usb_tty_name("/dev/ttyUSB0"));
        assert!(is_usb_tty_name("/dev/ttyACM1"));
        assert!(is_usb_tty_name("ttyACM0"));
    }

    #[test]
    fn test_non_usb_tty_names() {
        assert!(!is_usb_tty_name("/dev/ttyS0"));
        assert!(!is_usb_tty_name("/dev/ttyAMA0"));
        assert!(!is_usb_tty_name("/dev/USB/ttyS0"));
    }

    #[test]
    fn test_usb_port_type_is_candidate() {
        let info = SerialPortInfo {
            port_name: "/dev/cu.usbserial-0001".to_string(),
            port_type: SerialPortType::UsbPort(serialport::UsbPortInfo {
                vid: 0x10c4,
                pid: 0xea60,
                serial_number: None,
                manufacturer: None,
                product: None,
            }),
        };
        assert!(is_candidate(&info));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_builtin_uart_is_not_candidate() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        };
        assert!(!is_candidate(&info));
    }
}
