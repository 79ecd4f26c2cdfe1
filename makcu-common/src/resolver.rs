// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware variant resolution - pure logic without filesystem access.
//!
//! Some releases ship one image per connector (`V3.8_LEFT.bin`,
//! `V3.8_RIGHT.bin`), others a single image for both (`V2.0.bin`). The
//! resolver prefers the image made for the requested side and degrades to a
//! generic image, then to whatever the version has.
//!
//! How a file name is matched against a side lives behind [`SideMatcher`] so
//! the naming rule can change without touching callers.

use core::fmt;
use std::borrow::Cow;
use std::path::Path;

use crate::catalog::FirmwareCatalog;

/// Which connector/button combination the operator is flashing through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetSide {
    /// Main port, LEFT images.
    Main,
    /// Sub port, RIGHT images.
    Sub,
}

impl TargetSide {
    pub const ALL: [TargetSide; 2] = [TargetSide::Main, TargetSide::Sub];

    /// File name keyword marking images built for this side.
    pub fn keyword(self) -> &'static str {
        match self {
            TargetSide::Main => "LEFT",
            TargetSide::Sub => "RIGHT",
        }
    }
}

impl fmt::Display for TargetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSide::Main => write!(f, "Main (LEFT)"),
            TargetSide::Sub => write!(f, "Sub (RIGHT)"),
        }
    }
}

/// Classifies firmware file names with respect to a [`TargetSide`].
pub trait SideMatcher {
    /// The file is built specifically for `side`.
    fn is_for_side(&self, file_name: &str, side: TargetSide) -> bool;

    /// The file is not tied to any side.
    fn is_generic(&self, file_name: &str) -> bool {
        TargetSide::ALL
            .iter()
            .all(|side| !self.is_for_side(file_name, *side))
    }
}

/// Case-insensitive `LEFT` / `RIGHT` substring match.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordMatcher;

impl SideMatcher for KeywordMatcher {
    fn is_for_side(&self, file_name: &str, side: TargetSide) -> bool {
        file_name.to_ascii_uppercase().contains(side.keyword())
    }
}

/// Applies the resolution order with a given matcher.
#[derive(Clone, Debug, Default)]
pub struct Resolver<M = KeywordMatcher> {
    matcher: M,
}

impl Resolver<KeywordMatcher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: SideMatcher> Resolver<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Pick the image to flash for `version` on `side`.
    ///
    /// Order: an image for `side`, then a generic image, then the first image
    /// of the version. Returns `None` only when the version is unknown.
    pub fn resolve<'a>(
        &self,
        catalog: &'a FirmwareCatalog,
        version: &str,
        side: TargetSide,
    ) -> Option<&'a Path> {
        let files = catalog.files(version)?;

        if let Some(path) = files
            .iter()
            .find(|p| self.matcher.is_for_side(&file_name(p), side))
        {
            return Some(path.as_path());
        }

        if let Some(path) = files
            .iter()
            .find(|p| self.matcher.is_generic(&file_name(p)))
        {
            log::debug!(
                "No {} image for {}, using generic {}",
                side.keyword(),
                version,
                path.display()
            );
            return Some(path.as_path());
        }

        let first = files.first()?;
        log::warn!(
            "No {} or generic image for {}, falling back to {}",
            side.keyword(),
            version,
            first.display()
        );
        Some(first.as_path())
    }
}

fn file_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
}

/// Resolve with the default keyword matcher.
pub fn resolve<'a>(
    catalog: &'a FirmwareCatalog,
    version: &str,
    side: TargetSide,
) -> Option<&'a Path> {
    Resolver::new().resolve(catalog, version, side)
}
