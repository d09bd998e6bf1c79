// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with the six-digit hex form used on the wire.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// RGB color with 8-bit channels (0-255).
///
/// Colors travel inside `d50` strings as `RRGGBB` uppercase hex blocks.
///
/// # Examples
///
/// ```
/// use lepro_lib::types::RgbColor;
///
/// let color = RgbColor::new(255, 128, 0);
/// assert_eq!(color.to_hex(), "FF8000");
///
/// let red = RgbColor::from_hex("#FF0000").unwrap();
/// assert_eq!(red, RgbColor::new(255, 0, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Pure white, the fallback color of every segment.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses an RGB color from a six-digit hex string, with or without `#`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHexColor` if the string is not exactly six
    /// hex digits.
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ValueError::InvalidHexColor(hex.to_string()));
        }
        let r = parse_hex_pair(&digits[0..2])?;
        let g = parse_hex_pair(&digits[2..4])?;
        let b = parse_hex_pair(&digits[4..6])?;
        Ok(Self::new(r, g, b))
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the color as an uppercase `RRGGBB` string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<RgbColor> for (u8, u8, u8) {
    fn from(color: RgbColor) -> Self {
        (color.red, color.green, color.blue)
    }
}

fn parse_hex_pair(s: &str) -> Result<u8, ValueError> {
    u8::from_str_radix(s, 16).map_err(|_| ValueError::InvalidHexColor(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_is_uppercase() {
        let color = RgbColor::from_hex("ff8000").unwrap();
        assert_eq!(color.to_hex(), "FF8000");
        assert_eq!(color.to_string(), "#FF8000");
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(RgbColor::from_hex("FF00").is_err());
        assert!(RgbColor::from_hex("GG0000").is_err());
        assert!(RgbColor::from_hex("FF00001").is_err());
    }

    #[test]
    fn default_is_white() {
        assert_eq!(RgbColor::default(), RgbColor::new(255, 255, 255));
    }

    #[test]
    fn tuple_conversions() {
        let color: RgbColor = (1, 2, 3).into();
        let back: (u8, u8, u8) = color.into();
        assert_eq!(back, (1, 2, 3));
    }
}
