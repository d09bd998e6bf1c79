// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for strip control.
//!
//! # Types
//!
//! - [`RgbColor`] - 8-bit RGB color with `RRGGBB` hex form
//! - [`Effect`] - Grouped (`d50`) and special (`d60`) animation effects
//! - [`Mode`] - Device mode (`d2`) selecting the governing payload field
//! - [`SegmentColors`] - The 25 per-segment colors of a strip
//! - [`ColorGroup`] - A run of equal adjacent segment colors

mod effect;
mod rgb_color;
mod segments;

pub use effect::{Effect, Mode};
pub use rgb_color::RgbColor;
pub use segments::{ColorGroup, SEGMENT_COUNT, SegmentColors, compress, expand, normalize_to_25};
