// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric transforms between UI percentages and device codes.
//!
//! The speed curve constants were measured against real hardware and are
//! protocol constants. None of these pairs round-trip exactly.

use crate::error::ParseError;

/// Speed code meaning "stopped" (0 %).
pub const SPEED_STOPPED_CODE: &str = "1000";

const SPEED_SLOPE: f64 = -117.41;
const SPEED_OFFSET: f64 = 597.75;

/// Largest sensitivity code (`0x63`), reached at 100 %.
const SENSITIVITY_MAX_CODE: u8 = 0x63;

/// Largest device-domain brightness.
pub const DEVICE_BRIGHTNESS_MAX: u16 = 1000;

/// Converts a speed percentage to its 4-hex-digit device code.
///
/// # Examples
///
/// ```
/// use lepro_lib::codec::speed_to_code;
///
/// assert_eq!(speed_to_code(0), "1000");
/// assert_eq!(speed_to_code(50), "0088");
/// assert_eq!(speed_to_code(100), "0038");
/// ```
#[must_use]
pub fn speed_to_code(percent: u8) -> String {
    if percent == 0 {
        return SPEED_STOPPED_CODE.to_string();
    }
    let percent = f64::from(percent.min(100));
    // 1..=100 % maps to raw codes 56..=516.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let raw = (SPEED_SLOPE * (percent + 1.0).ln() + SPEED_OFFSET).round() as u16;
    format!("0{raw:03X}")
}

/// Converts a 4-hex-digit device speed code back to a percentage (0.0-100.0).
///
/// # Errors
///
/// Returns `ParseError::InvalidValue` if the code's last three characters are
/// not hex digits.
pub fn code_to_speed(code: &str) -> Result<f64, ParseError> {
    if code.eq_ignore_ascii_case(SPEED_STOPPED_CODE) {
        return Ok(0.0);
    }
    let digits = code
        .get(code.len().saturating_sub(3)..)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("speed", code))?;
    let raw = u16::from_str_radix(digits, 16).map_err(|_| invalid("speed", code))?;
    let percent = ((f64::from(raw) - SPEED_OFFSET) / SPEED_SLOPE).exp() - 1.0;
    Ok(percent.clamp(0.0, 100.0))
}

/// Converts a sensitivity percentage to its 2-hex-digit device code
/// (`00`..`63`).
#[must_use]
pub fn sensitivity_to_code(percent: u8) -> String {
    let scaled = f64::from(percent.min(100)) * f64::from(SENSITIVITY_MAX_CODE) / 100.0;
    // Bounded to 0..=99 by the clamp on the input.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let code = (scaled.round() as u8).min(SENSITIVITY_MAX_CODE);
    format!("{code:02X}")
}

/// Converts a 2-hex-digit sensitivity code to a percentage (0-100).
///
/// Unparsable codes read as `0x00`.
#[must_use]
pub fn code_to_sensitivity(code: &str) -> u8 {
    let value = u8::from_str_radix(code, 16).unwrap_or(0);
    round_percent(f64::from(value) * 100.0 / f64::from(SENSITIVITY_MAX_CODE))
}

/// Rounds a percentage to the nearest integer within 0-100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_percent(percent: f64) -> u8 {
    percent.round().clamp(0.0, 100.0) as u8
}

/// Maps UI brightness (0-255) to device brightness (0-1000), truncating.
///
/// `brightness_from_device(brightness_to_device(x))` may differ from `x` by
/// one step; the scales are not an exact round-trip.
#[must_use]
pub fn brightness_to_device(brightness: u8) -> u16 {
    let device = u32::from(brightness) * u32::from(DEVICE_BRIGHTNESS_MAX) / 255;
    u16::try_from(device).unwrap_or(DEVICE_BRIGHTNESS_MAX)
}

/// Maps device brightness (0-1000) to UI brightness (0-255), truncating.
///
/// Values above 1000 are treated as 1000.
#[must_use]
pub fn brightness_from_device(device: u16) -> u8 {
    let device = u32::from(device.min(DEVICE_BRIGHTNESS_MAX));
    u8::try_from(device * 255 / u32::from(DEVICE_BRIGHTNESS_MAX)).unwrap_or(u8::MAX)
}

fn invalid(field: &str, value: &str) -> ParseError {
    ParseError::InvalidValue {
        field: field.to_string(),
        message: format!("not a hex code: {value:?}"),
    }
}
