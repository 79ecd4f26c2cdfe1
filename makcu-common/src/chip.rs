// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Supported ESP32 variants.

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

/// Chip type passed to esptool's `--chip` option.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Chip {
    /// ESP32
    #[default]
    Esp32,
    /// ESP32-S3
    Esp32s3,
    /// ESP32-C3
    Esp32c3,
    /// ESP32-S2
    Esp32s2,
}

impl Chip {
    /// All supported chips, in the order they are offered to the operator.
    pub const ALL: [Chip; 4] = [Chip::Esp32, Chip::Esp32s3, Chip::Esp32c3, Chip::Esp32s2];

    /// esptool tag for this chip.
    pub fn tag(self) -> &'static str {
        self.into()
    }

    /// Tags of all supported chips.
    pub fn tags() -> &'static [&'static str] {
        Self::VARIANTS
    }

    /// Parse the chip name esptool prints while detecting, e.g. `ESP32-S3`,
    /// `ESP32-C3 (QFN32) (revision v0.4)` or `ESP32-D0WD-V3`.
    ///
    /// Only the first word is considered. A family is a `S`, `C`, `H` or `P`
    /// series letter followed by a digit; anything else after `ESP32-` is a
    /// package code of the original ESP32 (`D0WD`, `D2WD`, `U4WDH`,
    /// `PICO-D4`, ...) and maps to [`Chip::Esp32`]. Families outside the
    /// supported set (`ESP32-C6`, `ESP32-H2`, ...) yield `None`.
    pub fn from_description(description: &str) -> Option<Chip> {
        let word = description.split_whitespace().next()?;
        let mut parts = word.split('-');
        if !parts.next()?.eq_ignore_ascii_case("esp32") {
            return None;
        }

        let Some(variant) = parts.next() else {
            return Some(Chip::Esp32);
        };
        let variant = variant.to_ascii_lowercase();
        let mut chars = variant.chars();
        let family = matches!(
            (chars.next(), chars.next()),
            (Some('s' | 'c' | 'h' | 'p'), Some('1'..='9'))
        );

        if !family {
            Some(Chip::Esp32)
        } else if variant.starts_with("s3") {
            Some(Chip::Esp32s3)
        } else if variant.starts_with("s2") {
            Some(Chip::Esp32s2)
        } else if variant.starts_with("c3") {
            Some(Chip::Esp32c3)
        } else {
            None
        }
    }
}
