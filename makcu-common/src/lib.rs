// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and logic for the Makcu firmware uploader.
//!
//! Everything in here is free of serial or subprocess I/O so that it can be
//! tested on any host:
//! - [`catalog`]: discovery of firmware images, grouped by version label
//! - [`resolver`]: picking the image for a (version, side) selection
//! - [`chip`]: the supported ESP32 variants
//! - [`error`]: the failure taxonomy and classification of esptool output
//! - [`selection`]: parsing of interactive prompt answers

pub mod catalog;
pub mod chip;
pub mod error;
pub mod resolver;
pub mod selection;

// Re-export commonly used types
pub use catalog::{scan, version_label, FirmwareCatalog, DEFAULT_SEARCH_DIRS};
pub use chip::Chip;
pub use error::{classify_failure, FlashError};
pub use resolver::{resolve, KeywordMatcher, Resolver, SideMatcher, TargetSide};
