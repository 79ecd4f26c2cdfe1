// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Parsing of interactive prompt answers.
//!
//! Menus are numbered from 1. An answer that cannot be understood is an
//! [`FlashError::InvalidSelection`]; the caller aborts the run rather than
//! asking again.

use crate::catalog::FirmwareCatalog;
use crate::chip::Chip;
use crate::error::FlashError;
use crate::resolver::TargetSide;

/// Map a 1-based menu answer to an index into a list of `len` items.
pub fn menu_index(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

/// Serial port answer: a listed index, or a device name typed by hand.
pub fn parse_port(input: &str, ports: &[String]) -> Result<String, FlashError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FlashError::InvalidSelection(input.to_string()));
    }

    match menu_index(input, ports.len()) {
        Some(idx) => Ok(ports[idx].clone()),
        None => Ok(input.to_string()),
    }
}

/// Version answer: a listed index or a version label.
pub fn parse_version(input: &str, catalog: &FirmwareCatalog) -> Result<String, FlashError> {
    let input = input.trim();

    if let Some(idx) = menu_index(input, catalog.len()) {
        if let Some(version) = catalog.versions().nth(idx) {
            return Ok(version.to_string());
        }
    }

    catalog
        .versions()
        .find(|v| v.eq_ignore_ascii_case(input))
        .map(str::to_string)
        .ok_or_else(|| FlashError::InvalidSelection(input.to_string()))
}

/// Side answer: `1`, `main` or `left` for Main; `2`, `sub` or `right` for Sub.
pub fn parse_side(input: &str) -> Result<TargetSide, FlashError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "main" | "left" => Ok(TargetSide::Main),
        "2" | "sub" | "right" => Ok(TargetSide::Sub),
        other => Err(FlashError::InvalidSelection(other.to_string())),
    }
}

/// Chip answer: empty keeps `default`, otherwise a listed index or a chip tag.
pub fn parse_chip(input: &str, default: Chip) -> Result<Chip, FlashError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }

    match menu_index(input, Chip::ALL.len()) {
        Some(idx) => Ok(Chip::ALL[idx]),
        None => input
            .parse()
            .map_err(|_| FlashError::InvalidSelection(input.to_string())),
    }
}
