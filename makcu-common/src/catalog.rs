// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware discovery.
//!
//! A firmware directory holds images named `<VERSION>[_<SUFFIX>].bin`, for
//! example `V3.8_LEFT.bin`, `V3.8_RIGHT.bin` or `V2.0.bin`. Scanning groups
//! them by version label; the resulting [`FirmwareCatalog`] is a plain value
//! owned by the caller and dropped once a file has been resolved.

use std::fs;
use std::path::{Path, PathBuf};

/// Directories searched when the caller does not provide any, in priority order.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &["firmware", "../firmware", "."];

/// Extension of flashable images.
pub const FIRMWARE_EXTENSION: &str = "bin";

/// Prefix every version label must start with.
pub const VERSION_PREFIX: char = 'V';

/// Firmware images grouped by version label.
///
/// Versions keep the order in which they were first seen, and each version
/// maps to a non-empty list of paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirmwareCatalog {
    source: Option<PathBuf>,
    entries: Vec<(String, Vec<PathBuf>)>,
}

impl FirmwareCatalog {
    /// Create an empty catalog not tied to any directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `(label, paths)` pairs. Pairs with no paths are skipped
    /// and repeated labels are merged.
    pub fn from_entries<I, S, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<P>)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        let mut catalog = Self::new();
        for (label, paths) in entries {
            let label = label.into();
            for path in paths {
                catalog.insert(label.clone(), path.into());
            }
        }
        catalog
    }

    fn insert(&mut self, label: String, path: PathBuf) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, files)) => files.push(path),
            None => self.entries.push((label, vec![path])),
        }
    }

    /// Directory the catalog was scanned from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Version labels in discovery order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Files for `version`, in catalog order. Returns `None` for unknown versions.
    pub fn files(&self, version: &str) -> Option<&[PathBuf]> {
        self.entries
            .iter()
            .find(|(label, _)| label == version)
            .map(|(_, files)| files.as_slice())
    }

    /// Iterate over `(version, files)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.entries
            .iter()
            .map(|(label, files)| (label.as_str(), files.as_slice()))
    }
}

/// Extract the version label from a firmware file name.
///
/// The label is everything before the first underscore, with a trailing
/// `.bin` removed. Names whose label does not start with `V` are not
/// firmware images and yield `None`.
pub fn version_label(file_name: &str) -> Option<&str> {
    let head = file_name.split_once('_').map_or(file_name, |(head, _)| head);
    let label = strip_bin_suffix(head).unwrap_or(head);

    if label.starts_with(VERSION_PREFIX) {
        Some(label)
    } else {
        None
    }
}

fn strip_bin_suffix(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(FIRMWARE_EXTENSION.len() + 1)?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = name.split_at(split);
    (ext.starts_with('.') && ext[1..].eq_ignore_ascii_case(FIRMWARE_EXTENSION)).then_some(stem)
}

fn is_firmware_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FIRMWARE_EXTENSION))
}

/// List the `.bin` files of `dir`, sorted by file name.
///
/// A missing or unreadable directory is treated as holding no images.
fn list_firmware_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping firmware directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_firmware_file(path))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Scan `dirs` in order and catalog the first one that contains any `.bin` file.
///
/// Directories are never merged: once a directory with images is found the
/// remaining ones are ignored, even if none of its images carry a version
/// label (the catalog is then empty).
pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> FirmwareCatalog {
    for dir in dirs {
        let dir = dir.as_ref();
        let files = list_firmware_files(dir);
        if files.is_empty() {
            log::debug!("No firmware images in {}", dir.display());
            continue;
        }

        let mut catalog = FirmwareCatalog {
            source: Some(dir.to_path_buf()),
            entries: Vec::new(),
        };

        for path in files {
            let label = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(version_label)
                .map(str::to_owned);

            match label {
                Some(label) => catalog.insert(label, path),
                None => log::debug!("Ignoring {}: no version label", path.display()),
            }
        }

        log::debug!(
            "Found {} firmware version(s) in {}",
            catalog.len(),
            dir.display()
        );
        return catalog;
    }

    FirmwareCatalog::new()
}
