// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controllable lights.
//!
//! A [`LightController`] owns the tracked state of one strip and turns state
//! changes into property commands published through a
//! [`SessionManager`](crate::protocol::SessionManager). A [`SegmentLight`]
//! is a view over one of the strip's 25 segments.
//!
//! Both implement the [`Light`] capability so a host registry can drive
//! whole strips and single segments the same way.
//!
//! # Examples
//!
//! ```no_run
//! use lepro_lib::light::{Light, LightController, TurnOnPatch};
//! use lepro_lib::types::{Effect, RgbColor};
//!
//! # async fn example(light: LightController) -> lepro_lib::Result<()> {
//! light
//!     .turn_on(
//!         TurnOnPatch::new()
//!             .with_color(RgbColor::new(255, 64, 0))
//!             .with_effect(Effect::Breath),
//!     )
//!     .await?;
//!
//! let segment = light.segment(3)?;
//! segment.set_color(RgbColor::new(0, 0, 255)).await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod segment;

pub use controller::LightController;
pub use segment::SegmentLight;

use crate::types::{Effect, RgbColor};

/// Optional changes applied by [`Light::turn_on`].
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOnPatch {
    /// UI-domain brightness (0-255).
    pub brightness: Option<u8>,
    /// Color for every segment, or for the addressed segment only.
    pub color: Option<RgbColor>,
    /// Effect to run.
    pub effect: Option<Effect>,
}

impl TurnOnPatch {
    /// Creates an empty patch that only powers the light on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            brightness: None,
            color: None,
            effect: None,
        }
    }

    /// Sets the brightness.
    #[must_use]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the color.
    #[must_use]
    pub const fn with_color(mut self, color: RgbColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the effect.
    #[must_use]
    pub const fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Returns `true` if the patch changes nothing besides power.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.brightness.is_none() && self.color.is_none() && self.effect.is_none()
    }
}

/// A light that can be switched and queried.
#[allow(async_fn_in_trait)]
pub trait Light {
    /// Returns `true` if the light is on.
    fn is_on(&self) -> bool;

    /// Returns the UI-domain brightness (0-255).
    fn brightness(&self) -> u8;

    /// Returns the active effect.
    fn effect(&self) -> Effect;

    /// Returns the color shown by this light.
    fn color(&self) -> RgbColor;

    /// Turns the light on, applying `patch` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be built or sent.
    async fn turn_on(&self, patch: TurnOnPatch) -> crate::Result<()>;

    /// Turns the light off.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be built or sent.
    async fn turn_off(&self) -> crate::Result<()>;
}
