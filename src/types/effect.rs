// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Animation effects and the device mode that selects their payload field.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Light animation effect.
///
/// Grouped effects are encoded in the `d50` string together with the segment
/// colors; special effects are encoded in the `d60` string through a fixed
/// prefix.
///
/// | Effect | Family | Animated |
/// |--------|--------|----------|
/// | `solid` | grouped | no |
/// | `breath`, `gradient`, `clockwise`, `counterclockwise`, `circular` | grouped | yes (speed) |
/// | `flash`, `wave1..4`, `laser1..4` | special | sensitivity |
///
/// # Examples
///
/// ```
/// use lepro_lib::types::{Effect, Mode};
///
/// let effect: Effect = "wave_2".parse().unwrap();
/// assert_eq!(effect, Effect::Wave2);
/// assert!(effect.is_special());
/// assert_eq!(effect.mode(), Mode::Special);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Static colors.
    #[default]
    Solid,
    /// Brightness pulsing.
    Breath,
    /// Color gradient sweep.
    Gradient,
    /// Segments rotating clockwise.
    Clockwise,
    /// Segments rotating counterclockwise.
    Counterclockwise,
    /// Circular chase.
    Circular,
    /// Flash (special).
    Flash,
    /// Wave pattern 1 (special).
    Wave1,
    /// Wave pattern 2 (special).
    Wave2,
    /// Wave pattern 3 (special).
    Wave3,
    /// Wave pattern 4 (special).
    Wave4,
    /// Laser pattern 1 (special).
    Laser1,
    /// Laser pattern 2 (special).
    Laser2,
    /// Laser pattern 3 (special).
    Laser3,
    /// Laser pattern 4 (special).
    Laser4,
}

impl Effect {
    /// Every effect, in the order a host UI should list them.
    pub const ALL: [Self; 15] = [
        Self::Solid,
        Self::Breath,
        Self::Gradient,
        Self::Clockwise,
        Self::Counterclockwise,
        Self::Circular,
        Self::Flash,
        Self::Wave1,
        Self::Wave2,
        Self::Wave3,
        Self::Wave4,
        Self::Laser1,
        Self::Laser2,
        Self::Laser3,
        Self::Laser4,
    ];

    /// Returns `true` for effects carried by the `d60` string.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(
            self,
            Self::Flash
                | Self::Wave1
                | Self::Wave2
                | Self::Wave3
                | Self::Wave4
                | Self::Laser1
                | Self::Laser2
                | Self::Laser3
                | Self::Laser4
        )
    }

    /// Returns `true` for grouped effects whose animation uses the speed value.
    #[must_use]
    pub const fn uses_speed(self) -> bool {
        matches!(
            self,
            Self::Breath | Self::Gradient | Self::Clockwise | Self::Counterclockwise | Self::Circular
        )
    }

    /// Returns the device mode this effect requires.
    #[must_use]
    pub const fn mode(self) -> Mode {
        if self.is_special() {
            Mode::Special
        } else {
            Mode::Grouped
        }
    }

    /// Returns the canonical effect name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Breath => "breath",
            Self::Gradient => "gradient",
            Self::Clockwise => "clockwise",
            Self::Counterclockwise => "counterclockwise",
            Self::Circular => "circular",
            Self::Flash => "flash",
            Self::Wave1 => "wave1",
            Self::Wave2 => "wave2",
            Self::Wave3 => "wave3",
            Self::Wave4 => "wave4",
            Self::Laser1 => "laser1",
            Self::Laser2 => "laser2",
            Self::Laser3 => "laser3",
            Self::Laser4 => "laser4",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = ValueError;

    /// Parses an effect name, case-insensitively. `wave_1` style names are
    /// accepted as aliases of `wave1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "");
        Self::ALL
            .into_iter()
            .find(|effect| effect.as_str() == normalized)
            .ok_or_else(|| ValueError::UnknownEffect(s.to_string()))
    }
}

/// Device operating mode (`d2`).
///
/// Selects which payload field governs the strip's appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Mode 2: grouped colors and effects from `d50`.
    #[default]
    Grouped,
    /// Mode 3: special effects from `d60`.
    Special,
    /// Any other value reported by the device.
    Other(u8),
}

impl Mode {
    /// Returns the wire value of this mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Grouped => 2,
            Self::Special => 3,
            Self::Other(code) => code,
        }
    }
}

impl From<u8> for Mode {
    fn from(code: u8) -> Self {
        match code {
            2 => Self::Grouped,
            3 => Self::Special,
            other => Self::Other(other),
        }
    }
}
