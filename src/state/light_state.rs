// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tracked state of one strip.

use crate::codec::{
    DEFAULT_SENSITIVITY, DEFAULT_SPEED, brightness_from_device, brightness_to_device, decode_d50,
    decode_d60, encode_d50, encode_d60,
};
use crate::command::DeviceCommand;
use crate::error::ValueError;
use crate::types::{Effect, Mode, RgbColor, SegmentColors};

use super::DeviceReport;

/// Snapshot of a strip's appearance.
///
/// `effect` and `mode` are kept in agreement: special effects run in
/// [`Mode::Special`], every other effect in [`Mode::Grouped`].
///
/// # Examples
///
/// ```
/// use lepro_lib::state::LightState;
/// use lepro_lib::types::{Effect, RgbColor};
///
/// let state = LightState::new();
/// assert!(!state.is_on());
/// assert_eq!(state.brightness(), 255);
/// assert_eq!(state.effect(), Effect::Solid);
/// assert_eq!(state.primary_color(), RgbColor::WHITE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightState {
    is_on: bool,
    mode: Mode,
    /// UI-domain brightness (0-255).
    brightness: u8,
    effect: Effect,
    speed: u8,
    sensitivity: u8,
    segments: SegmentColors,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            is_on: false,
            mode: Mode::Grouped,
            brightness: u8::MAX,
            effect: Effect::Solid,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            segments: SegmentColors::default(),
        }
    }
}

impl LightState {
    /// Creates the state of a strip nothing is known about yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the strip is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the device mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the UI-domain brightness (0-255).
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Returns the active effect.
    #[must_use]
    pub const fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns the animation speed percentage.
    #[must_use]
    pub const fn speed(&self) -> u8 {
        self.speed
    }

    /// Returns the special-effect sensitivity percentage.
    #[must_use]
    pub const fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Returns all segment colors.
    #[must_use]
    pub const fn segments(&self) -> &SegmentColors {
        &self.segments
    }

    /// Returns the color of segment 0, mirrored to single-color controls.
    #[must_use]
    pub const fn primary_color(&self) -> RgbColor {
        self.segments.primary()
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.is_on = on;
    }

    pub(crate) fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Sets the effect and the mode it requires.
    pub(crate) fn set_effect(&mut self, effect: Effect) {
        self.effect = effect;
        self.mode = effect.mode();
    }

    pub(crate) fn set_speed(&mut self, speed: u8) {
        self.speed = speed.min(100);
    }

    pub(crate) fn set_sensitivity(&mut self, sensitivity: u8) {
        self.sensitivity = sensitivity.min(100);
    }

    pub(crate) fn fill_color(&mut self, color: RgbColor) {
        self.segments.fill(color);
    }

    pub(crate) fn set_segment(&mut self, index: usize, color: RgbColor) -> Result<(), ValueError> {
        self.segments.set(index, color)
    }

    /// Applies the fields present in `report`.
    ///
    /// A `d50` string replaces segments, effect and speed together; a `d60`
    /// string always updates sensitivity and updates the effect only when
    /// its prefix is recognized. Afterwards a special mode without a special
    /// effect resolves to [`Effect::Flash`].
    ///
    /// Returns `true` if anything changed.
    pub fn apply_report(&mut self, report: &DeviceReport) -> bool {
        let before = self.clone();

        if let Some(on) = report.power {
            self.is_on = on;
        }
        if let Some(mode) = report.mode {
            self.mode = Mode::from(mode);
        }
        if let Some(device) = report.brightness {
            self.brightness = brightness_from_device(device);
        }
        if let Some(d50) = &report.d50 {
            let grouped = decode_d50(d50);
            self.segments = grouped.segments;
            self.effect = grouped.effect;
            self.speed = grouped.speed;
        }
        if let Some(d60) = &report.d60 {
            let (sensitivity, effect) = decode_d60(d60);
            self.sensitivity = sensitivity;
            if let Some(effect) = effect {
                self.effect = effect;
            }
        }

        if self.mode == Mode::Special && !self.effect.is_special() {
            self.effect = Effect::Flash;
        }

        *self != before
    }

    /// Builds the power-on command describing this state.
    ///
    /// Special effects are sent as `d60` in mode 3, everything else as `d50`
    /// in mode 2. Returns `None`, after logging, when the effect has no
    /// encoding.
    #[must_use]
    pub fn to_command(&self) -> Option<DeviceCommand> {
        let brightness = brightness_to_device(self.brightness);
        if self.effect.is_special() {
            let Some(d60) = encode_d60(self.effect, self.sensitivity) else {
                tracing::error!(effect = %self.effect, "Unknown special effect, dropping command");
                return None;
            };
            Some(DeviceCommand::special(d60, brightness))
        } else {
            let d50 = encode_d50(&self.segments, self.effect, self.speed);
            Some(DeviceCommand::grouped(d50, brightness))
        }
    }
}
