// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `d60` special-effect strings.
//!
//! Layout: `<7-char effect prefix><2-hex sensitivity>0000`, for example
//! `2000064320000` is `flash` at sensitivity `0x32`.

use crate::types::Effect;

use super::numeric::{code_to_sensitivity, sensitivity_to_code};

const SUFFIX: &str = "0000";
const PREFIX_LEN: usize = 7;
const MIN_LEN: usize = PREFIX_LEN + 2;

/// Sensitivity reported when a `d60` string cannot be read.
pub const DEFAULT_SENSITIVITY: u8 = 50;

const PREFIXES: [(Effect, &str); 9] = [
    (Effect::Flash, "2000064"),
    (Effect::Wave1, "2010064"),
    (Effect::Wave2, "2020064"),
    (Effect::Wave3, "2030064"),
    (Effect::Wave4, "2040064"),
    (Effect::Laser1, "2050064"),
    (Effect::Laser2, "2060064"),
    (Effect::Laser3, "2070064"),
    (Effect::Laser4, "2080064"),
];

/// Returns the 7-character `d60` prefix of a special effect.
#[must_use]
pub fn effect_prefix(effect: Effect) -> Option<&'static str> {
    PREFIXES
        .iter()
        .find(|(e, _)| *e == effect)
        .map(|(_, prefix)| *prefix)
}

/// Encodes a special effect and sensitivity percentage.
///
/// Returns `None` for effects without a `d60` prefix (the grouped effects).
///
/// # Examples
///
/// ```
/// use lepro_lib::codec::encode_d60;
/// use lepro_lib::types::Effect;
///
/// assert_eq!(encode_d60(Effect::Flash, 50).as_deref(), Some("2000064320000"));
/// assert_eq!(encode_d60(Effect::Solid, 50), None);
/// ```
#[must_use]
pub fn encode_d60(effect: Effect, sensitivity: u8) -> Option<String> {
    let prefix = effect_prefix(effect)?;
    Some(format!(
        "{prefix}{}{SUFFIX}",
        sensitivity_to_code(sensitivity)
    ))
}

/// Decodes a `d60` string into `(sensitivity_percent, effect)`.
///
/// The effect is `None` when the prefix is not recognized. Strings shorter
/// than nine characters yield `(50, None)`.
#[must_use]
pub fn decode_d60(d60: &str) -> (u8, Option<Effect>) {
    let (Some(prefix), Some(code)) = (d60.get(..PREFIX_LEN), d60.get(PREFIX_LEN..MIN_LEN)) else {
        tracing::debug!(d60 = %d60, "d60 string too short, using defaults");
        return (DEFAULT_SENSITIVITY, None);
    };

    let effect = PREFIXES
        .iter()
        .find(|(_, p)| *p == prefix)
        .map(|(effect, _)| *effect);

    (code_to_sensitivity(code), effect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_flash_fixture() {
        assert_eq!(decode_d60("2000064320000"), (51, Some(Effect::Flash)));
    }

    #[test]
    fn encode_every_special_effect() {
        assert_eq!(encode_d60(Effect::Wave3, 0).unwrap(), "2030064000000");
        assert_eq!(encode_d60(Effect::Laser4, 100).unwrap(), "2080064630000");
        for effect in Effect::ALL {
            assert_eq!(encode_d60(effect, 10).is_some(), effect.is_special());
        }
    }

    #[test]
    fn decode_recovers_encoded_effect() {
        for effect in Effect::ALL.into_iter().filter(|e| e.is_special()) {
            let (_, decoded) = decode_d60(&encode_d60(effect, 75).unwrap());
            assert_eq!(decoded, Some(effect));
        }
    }

    #[test]
    fn unknown_prefix_keeps_sensitivity() {
        assert_eq!(decode_d60("9990064630000"), (100, None));
    }

    #[test]
    fn invalid_sensitivity_reads_as_zero() {
        assert_eq!(decode_d60("2010064XX0000"), (0, Some(Effect::Wave1)));
    }

    #[test]
    fn short_or_empty_input_uses_defaults() {
        assert_eq!(decode_d60(""), (50, None));
        assert_eq!(decode_d60("20000643"), (50, None));
    }

    #[test]
    fn non_ascii_input_does_not_panic() {
        assert_eq!(decode_d60("200006é40000"), (50, None));
    }
}
