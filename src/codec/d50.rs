// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `d50` grouped-color strings.
//!
//! # Layout
//!
//! ```text
//! N01:P1000 <n> <n × RRGGBB> F21000 <n> <n × LLLL> U3V3 <effect tail> ;
//! ```
//!
//! `<n>` is the group count in ASCII decimal with no fixed width, `LLLL` is a
//! group length in uppercase hex. Example for 25 white segments, solid:
//!
//! ```text
//! N01:P10001FFFFFFF2100010019U3V3000640000E1;
//! ```
//!
//! The effect tail is one of six fixed signatures. In the table below `####`
//! stands for a speed code from [`speed_to_code`](super::speed_to_code).

use crate::error::ParseError;
use crate::types::{
    ColorGroup, Effect, RgbColor, SegmentColors, compress, expand, normalize_to_25,
};

use super::numeric::{code_to_speed, round_percent, speed_to_code};

const HEADER: &str = "N01:";
const COLOR_MARKER: &str = "P1000";
const LENGTHS_MARKER: &str = "F21000";
const SEPARATOR: &str = "U3V3";
const TERMINATOR: char = ';';
const LEGACY_MARKER: &str = "P10001";

/// Placeholder for a 4-hex-digit speed code inside a tail signature.
const SPEED_SLOT: &str = "####";

/// Speed reported when a `d50` string carries none.
pub const DEFAULT_SPEED: u8 = 50;

/// Effect tail signatures, in decode precedence order.
const TAILS: [(Effect, &str); 6] = [
    (Effect::Solid, "000640000E1"),
    (Effect::Breath, "000640000E4####0000####1664"),
    (Effect::Gradient, "100640000E3####C2O6####"),
    (Effect::Clockwise, "00164####E1"),
    (Effect::Counterclockwise, "00264####E1"),
    (Effect::Circular, "100640000E1C2O6####"),
];

/// Colors, effect and speed carried by one `d50` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedState {
    /// Per-segment colors.
    pub segments: SegmentColors,
    /// Grouped effect.
    pub effect: Effect,
    /// Animation speed percentage.
    pub speed: u8,
}

impl Default for GroupedState {
    /// All-white, solid, speed 50: the state a failed decode falls back to.
    fn default() -> Self {
        Self {
            segments: SegmentColors::default(),
            effect: Effect::Solid,
            speed: DEFAULT_SPEED,
        }
    }
}

/// Encodes segment colors, a grouped effect and its speed.
///
/// Segment runs are normalized to exactly 25 before serialization. A special
/// effect has no `d50` tail; it is logged and encoded with an empty tail.
///
/// # Examples
///
/// ```
/// use lepro_lib::codec::encode_d50;
/// use lepro_lib::types::{Effect, RgbColor, SegmentColors};
///
/// let d50 = encode_d50(&SegmentColors::uniform(RgbColor::WHITE), Effect::Solid, 50);
/// assert_eq!(d50, "N01:P10001FFFFFFF2100010019U3V3000640000E1;");
/// ```
#[must_use]
pub fn encode_d50(segments: &SegmentColors, effect: Effect, speed: u8) -> String {
    let groups = normalize_to_25(compress(segments.as_slice()));
    let count = groups.len();

    let colors: String = groups.iter().map(|g| g.color.to_hex()).collect();
    let lengths: String = groups.iter().map(|g| format!("{:04X}", g.count)).collect();
    let tail = effect_tail(effect, speed);

    format!(
        "{HEADER}{COLOR_MARKER}{count}{colors}{LENGTHS_MARKER}{count}{lengths}{SEPARATOR}{tail}{TERMINATOR}"
    )
}

fn effect_tail(effect: Effect, speed: u8) -> String {
    match TAILS.iter().find(|(e, _)| *e == effect) {
        Some((_, signature)) => signature.replace(SPEED_SLOT, &speed_to_code(speed)),
        None => {
            tracing::warn!(effect = %effect, "Effect has no d50 tail, encoding empty tail");
            String::new()
        }
    }
}

/// Decodes a `d50` string, falling back to [`GroupedState::default`] on any
/// parse failure.
///
/// The failure is logged, never returned.
#[must_use]
pub fn decode_d50(d50: &str) -> GroupedState {
    try_decode_d50(d50).unwrap_or_else(|e| {
        tracing::error!(error = %e, d50 = %d50, "Error parsing d50, resetting to defaults");
        GroupedState::default()
    })
}

/// Decodes a `d50` string.
///
/// The grouped color block is read first; when its markers are missing the
/// older single-color form `P10001RRGGBB` is accepted instead. The effect is
/// found by scanning the whole string for the tail signatures; without a
/// match it stays `solid` at speed 50.
///
/// # Errors
///
/// Returns `ParseError` if the string is not ASCII or neither color form
/// can be read.
pub fn try_decode_d50(d50: &str) -> Result<GroupedState, ParseError> {
    if !d50.is_ascii() {
        return Err(ParseError::UnexpectedFormat(
            "d50 contains non-ASCII characters".to_string(),
        ));
    }
    let segments = match find_grouped_block(d50) {
        Some((color_start, lengths_start)) => decode_groups(d50, color_start, lengths_start)?,
        None => decode_legacy_color(d50)?,
    };

    let (effect, speed) = decode_effect(d50)?;
    Ok(GroupedState {
        segments,
        effect,
        speed,
    })
}

/// Returns the byte offsets just past `P1000` and at `F21000`.
fn find_grouped_block(d50: &str) -> Option<(usize, usize)> {
    let marker = d50.find(COLOR_MARKER)?;
    let color_start = marker + COLOR_MARKER.len();
    let lengths_start = color_start + d50.get(color_start..)?.find(LENGTHS_MARKER)?;
    Some((color_start, lengths_start))
}

fn decode_groups(
    d50: &str,
    color_start: usize,
    lengths_start: usize,
) -> Result<SegmentColors, ParseError> {
    let block = &d50[color_start..lengths_start];

    // The group count has no fixed width: take the first digit-width whose
    // count matches the remaining color data exactly.
    let (digits, count) = (1..=3)
        .find_map(|width| {
            let token = block.get(..width)?;
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let candidate: usize = token.parse().ok()?;
            (block.len() - width == 6 * candidate).then_some((width, candidate))
        })
        .ok_or_else(|| {
            ParseError::UnexpectedFormat("group count does not match color data".to_string())
        })?;

    let colors = (0..count)
        .map(|i| {
            let hex = block
                .get(digits + i * 6..digits + (i + 1) * 6)
                .ok_or_else(|| ParseError::MissingField(format!("color {i}")))?;
            RgbColor::from_hex(hex).map_err(|e| ParseError::InvalidValue {
                field: format!("color {i}"),
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // The count is repeated after F21000 with the same width.
    let count_start = lengths_start + LENGTHS_MARKER.len();
    let repeated = d50.get(count_start..count_start + digits);
    if repeated.and_then(|t| t.parse::<usize>().ok()) != Some(count) {
        tracing::debug!(
            expected = count,
            found = ?repeated,
            "d50 repeated group count differs"
        );
    }

    let lengths_from = count_start + digits;
    let lengths_hex = d50
        .get(lengths_from..lengths_from + count * 4)
        .ok_or_else(|| ParseError::MissingField("group lengths".to_string()))?;

    let groups = colors
        .into_iter()
        .enumerate()
        .map(|(i, color)| {
            let hex = lengths_hex
                .get(i * 4..(i + 1) * 4)
                .ok_or_else(|| ParseError::MissingField(format!("length {i}")))?;
            u16::from_str_radix(hex, 16)
                .map(|len| ColorGroup::new(color, len))
                .map_err(|_| ParseError::InvalidValue {
                    field: format!("length {i}"),
                    message: format!("not a hex length: {hex:?}"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expand(&groups))
}

fn decode_legacy_color(d50: &str) -> Result<SegmentColors, ParseError> {
    let start = d50
        .find(LEGACY_MARKER)
        .map(|i| i + LEGACY_MARKER.len())
        .ok_or_else(|| ParseError::MissingField(COLOR_MARKER.to_string()))?;
    let color = d50
        .get(start..start + 6)
        .filter(|hex| hex.bytes().all(is_upper_hex))
        .and_then(|hex| RgbColor::from_hex(hex).ok())
        .ok_or_else(|| ParseError::MissingField("legacy color".to_string()))?;
    Ok(SegmentColors::uniform(color))
}

fn decode_effect(d50: &str) -> Result<(Effect, u8), ParseError> {
    for (effect, signature) in TAILS {
        let Some(start) = find_signature(d50, signature) else {
            continue;
        };
        let speed = match signature.find(SPEED_SLOT) {
            Some(offset) => {
                let code = &d50[start + offset..start + offset + SPEED_SLOT.len()];
                round_percent(code_to_speed(code)?)
            }
            None => DEFAULT_SPEED,
        };
        return Ok((effect, speed));
    }
    Ok((Effect::Solid, DEFAULT_SPEED))
}

/// Finds the first offset where `signature` matches, `#` matching one
/// uppercase hex digit.
fn find_signature(haystack: &str, signature: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pattern = signature.as_bytes();
    if hay.len() < pattern.len() {
        return None;
    }
    (0..=hay.len() - pattern.len()).find(|&start| {
        hay[start..start + pattern.len()]
            .iter()
            .zip(pattern)
            .all(|(&b, &p)| if p == b'#' { is_upper_hex(b) } else { b == p })
    })
}

fn is_upper_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'A'..=b'F').contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SEGMENT_COUNT;

    const WHITE_SOLID: &str = "N01:P10001FFFFFFF2100010019U3V3000640000E1;";
    const RED: RgbColor = RgbColor::new(255, 0, 0);
    const GREEN: RgbColor = RgbColor::new(0, 255, 0);
    const BLUE: RgbColor = RgbColor::new(0, 0, 255);

    fn striped() -> SegmentColors {
        let mut colors = vec![RED; 5];
        colors.extend([GREEN; 10]);
        colors.extend([BLUE; 10]);
        SegmentColors::from_colors(&colors)
    }

    #[test]
    fn solid_white_encodes_and_decodes() {
        let white = SegmentColors::uniform(RgbColor::WHITE);
        let d50 = encode_d50(&white, Effect::Solid, 50);
        assert_eq!(d50, WHITE_SOLID);

        let state = try_decode_d50(&d50).unwrap();
        assert_eq!(state.segments, white);
        assert_eq!(state.effect, Effect::Solid);
        assert_eq!(state.speed, 50);
    }

    #[test]
    fn three_runs_encode_lengths_block() {
        let d50 = encode_d50(&striped(), Effect::Solid, 50);
        assert_eq!(
            d50,
            "N01:P10003FF000000FF000000FFF2100030005000A000AU3V3000640000E1;"
        );

        let state = try_decode_d50(&d50).unwrap();
        let groups = compress(state.segments.as_slice());
        let lengths: Vec<u16> = groups.iter().map(|g| g.count).collect();
        assert_eq!(lengths, vec![5, 10, 10]);
        assert_eq!(state.segments, striped());
    }

    #[test]
    fn group_count_width_is_inferred() {
        let mut segments = SegmentColors::uniform(RED);
        for i in 0..12 {
            let shade = u8::try_from(i * 10).unwrap();
            segments.set(i, RgbColor::new(shade, 1, 2)).unwrap();
        }
        let d50 = encode_d50(&segments, Effect::Solid, 50);
        assert!(d50.starts_with("N01:P100013"));
        assert!(d50.contains("F2100013"));

        let state = try_decode_d50(&d50).unwrap();
        assert_eq!(state.segments, segments);
    }

    #[test]
    fn animated_effects_carry_speed() {
        let white = SegmentColors::default();
        for effect in [
            Effect::Breath,
            Effect::Gradient,
            Effect::Clockwise,
            Effect::Counterclockwise,
            Effect::Circular,
        ] {
            let state = try_decode_d50(&encode_d50(&white, effect, 80)).unwrap();
            assert_eq!(state.effect, effect);
            assert!(state.speed.abs_diff(80) <= 1, "{effect}: {}", state.speed);
        }
    }

    #[test]
    fn effect_tails_match_wire_format() {
        let white = SegmentColors::default();
        let tail = |effect| {
            let d50 = encode_d50(&white, effect, 50);
            let start = d50.find(SEPARATOR).unwrap() + SEPARATOR.len();
            d50[start..d50.len() - 1].to_string()
        };
        assert_eq!(tail(Effect::Breath), "000640000E40088000000881664");
        assert_eq!(tail(Effect::Gradient), "100640000E30088C2O60088");
        assert_eq!(tail(Effect::Clockwise), "001640088E1");
        assert_eq!(tail(Effect::Counterclockwise), "002640088E1");
        assert_eq!(tail(Effect::Circular), "100640000E1C2O60088");
    }

    #[test]
    fn stopped_speed_uses_sentinel_code() {
        let d50 = encode_d50(&SegmentColors::default(), Effect::Clockwise, 0);
        assert!(d50.ends_with("U3V3001641000E1;"));
        assert_eq!(try_decode_d50(&d50).unwrap().speed, 0);
    }

    #[test]
    fn special_effect_gets_empty_tail() {
        let d50 = encode_d50(&SegmentColors::default(), Effect::Flash, 50);
        assert!(d50.ends_with("U3V3;"));
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let state = decode_d50("garbage");
        assert_eq!(state, GroupedState::default());
        assert_eq!(state.segments, SegmentColors::uniform(RgbColor::WHITE));
        assert_eq!(state.effect, Effect::Solid);
        assert_eq!(state.speed, 50);
        assert!(try_decode_d50("garbage").is_err());
    }

    #[test]
    fn truncated_lengths_fall_back() {
        let truncated = &WHITE_SOLID[..WHITE_SOLID.find("0019").unwrap() + 2];
        assert!(try_decode_d50(truncated).is_err());
        assert_eq!(decode_d50(truncated), GroupedState::default());
    }

    #[test]
    fn inconsistent_group_count_falls_back() {
        assert!(try_decode_d50("N01:P10002FFFFFFF2100020019U3V3000640000E1;").is_err());
    }

    #[test]
    fn non_ascii_input_falls_back() {
        let in_lengths = "N01:P10002FF000000FF00F210002000\u{e9}000U3V3000640000E1;";
        let in_colors = "N01:P10001FFFF\u{e9}F2100010019U3V3000640000E1;";
        for d50 in [in_lengths, in_colors] {
            assert!(try_decode_d50(d50).is_err());
            assert_eq!(decode_d50(d50), GroupedState::default());
        }
    }

    #[test]
    fn legacy_single_color_form() {
        let state = try_decode_d50("N01:P1000100FF00U3V3001640088E1;").unwrap();
        assert_eq!(state.segments, SegmentColors::uniform(GREEN));
        assert_eq!(state.effect, Effect::Clockwise);
        assert_eq!(state.speed, 50);
    }

    #[test]
    fn short_runs_pad_to_full_strip() {
        // Two groups covering 3 segments in total.
        let state = try_decode_d50("N01:P10002FF000000FF00F21000200020001U3V3000640000E1;").unwrap();
        assert_eq!(state.segments[0], RED);
        assert_eq!(state.segments[2], GREEN);
        assert_eq!(state.segments[SEGMENT_COUNT - 1], GREEN);
    }

    #[test]
    fn missing_tail_defaults_to_solid() {
        let state = try_decode_d50("N01:P10001FFFFFFF2100010019U3V3;").unwrap();
        assert_eq!(state.effect, Effect::Solid);
        assert_eq!(state.speed, 50);
    }
}
