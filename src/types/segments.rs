// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment colors and their run-length color groups.
//!
//! A strip has [`SEGMENT_COUNT`] independently colorable segments. On the wire
//! the colors travel as contiguous runs ([`ColorGroup`]) whose lengths must
//! add up to exactly 25.
//!
//! # Examples
//!
//! ```
//! use lepro_lib::types::{RgbColor, SegmentColors, compress, expand, normalize_to_25};
//!
//! let mut segments = SegmentColors::uniform(RgbColor::WHITE);
//! segments.set(0, RgbColor::new(255, 0, 0)).unwrap();
//!
//! let groups = normalize_to_25(compress(segments.as_slice()));
//! assert_eq!(groups.len(), 2);
//! assert_eq!(expand(&groups), segments);
//! ```

use std::ops::Index;

use crate::error::ValueError;

use super::RgbColor;

/// Number of segments on a strip.
pub const SEGMENT_COUNT: usize = 25;

/// A run of `count` adjacent segments sharing one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorGroup {
    /// The run's color.
    pub color: RgbColor,
    /// Number of segments in the run.
    pub count: u16,
}

impl ColorGroup {
    /// Creates a new color group.
    #[must_use]
    pub const fn new(color: RgbColor, count: u16) -> Self {
        Self { color, count }
    }
}

/// The ordered colors of all 25 segments.
///
/// Segment 0 is the primary color mirrored to single-color controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentColors([RgbColor; SEGMENT_COUNT]);

impl SegmentColors {
    /// Creates segment colors with every segment set to `color`.
    #[must_use]
    pub const fn uniform(color: RgbColor) -> Self {
        Self([color; SEGMENT_COUNT])
    }

    /// Builds segment colors from any sequence, padding with the last color
    /// (white when empty) or truncating to 25 entries.
    #[must_use]
    pub fn from_colors(colors: &[RgbColor]) -> Self {
        let fill = colors.last().copied().unwrap_or(RgbColor::WHITE);
        let mut segments = [fill; SEGMENT_COUNT];
        for (slot, color) in segments.iter_mut().zip(colors) {
            *slot = *color;
        }
        Self(segments)
    }

    /// Returns the color of segment `index`, or `None` past the last segment.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<RgbColor> {
        self.0.get(index).copied()
    }

    /// Sets the color of segment `index`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::SegmentIndex` if `index >= 25`.
    pub fn set(&mut self, index: usize, color: RgbColor) -> Result<(), ValueError> {
        let slot = self
            .0
            .get_mut(index)
            .ok_or(ValueError::SegmentIndex(index))?;
        *slot = color;
        Ok(())
    }

    /// Sets every segment to `color`.
    pub fn fill(&mut self, color: RgbColor) {
        self.0 = [color; SEGMENT_COUNT];
    }

    /// Returns the primary (segment 0) color.
    #[must_use]
    pub const fn primary(&self) -> RgbColor {
        self.0[0]
    }

    /// Returns the colors as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[RgbColor] {
        &self.0
    }

    /// Iterates over the segment colors in order.
    pub fn iter(&self) -> impl Iterator<Item = &RgbColor> {
        self.0.iter()
    }
}

impl Default for SegmentColors {
    fn default() -> Self {
        Self::uniform(RgbColor::WHITE)
    }
}

impl Index<usize> for SegmentColors {
    type Output = RgbColor;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Merges adjacent equal colors into runs, preserving order.
#[must_use]
pub fn compress(colors: &[RgbColor]) -> Vec<ColorGroup> {
    let mut groups: Vec<ColorGroup> = Vec::new();
    for &color in colors {
        match groups.last_mut() {
            Some(last) if last.color == color => last.count = last.count.saturating_add(1),
            _ => groups.push(ColorGroup::new(color, 1)),
        }
    }
    groups
}

/// Adjusts run lengths so they add up to exactly 25 segments.
///
/// A shortfall extends the last group. An excess first shrinks the last group
/// when it is longer than the excess, otherwise groups are dropped from the end
/// until the total fits. An empty input becomes one white group of 25.
#[must_use]
pub fn normalize_to_25(mut groups: Vec<ColorGroup>) -> Vec<ColorGroup> {
    const TARGET: u32 = 25;
    let total = |groups: &[ColorGroup]| groups.iter().map(|g| u32::from(g.count)).sum::<u32>();

    if groups.is_empty() {
        return vec![ColorGroup::new(RgbColor::WHITE, 25)];
    }

    let sum = total(&groups);
    if sum < TARGET {
        if let Some(last) = groups.last_mut() {
            // Shortfall is at most 25.
            let shortfall = u16::try_from(TARGET - sum).unwrap_or(25);
            last.count = last.count.saturating_add(shortfall);
        }
        return groups;
    }

    while total(&groups) > TARGET {
        let excess = total(&groups) - TARGET;
        let Some(last) = groups.last_mut() else {
            break;
        };
        if u32::from(last.count) > excess {
            // excess < last.count, so it fits in u16.
            last.count -= u16::try_from(excess).unwrap_or(last.count);
        } else {
            groups.pop();
        }
    }

    groups
}

/// Expands runs back into per-segment colors.
///
/// The result always holds exactly 25 segments: a short expansion is padded
/// with its last color and a long one is truncated.
#[must_use]
pub fn expand(groups: &[ColorGroup]) -> SegmentColors {
    let colors: Vec<RgbColor> = groups
        .iter()
        .flat_map(|g| std::iter::repeat_n(g.color, usize::from(g.count)))
        .take(SEGMENT_COUNT)
        .collect();
    SegmentColors::from_colors(&colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: RgbColor = RgbColor::new(255, 0, 0);
    const GREEN: RgbColor = RgbColor::new(0, 255, 0);
    const BLUE: RgbColor = RgbColor::new(0, 0, 255);

    fn counts(groups: &[ColorGroup]) -> Vec<u16> {
        groups.iter().map(|g| g.count).collect()
    }

    fn striped() -> SegmentColors {
        let mut colors = vec![RED; 5];
        colors.extend([GREEN; 10]);
        colors.extend([BLUE; 10]);
        SegmentColors::from_colors(&colors)
    }

    #[test]
    fn compress_merges_adjacent_runs_only() {
        let groups = compress(&[RED, RED, GREEN, RED]);
        assert_eq!(counts(&groups), vec![2, 1, 1]);
        assert_eq!(groups[2].color, RED);
    }

    #[test]
    fn compress_expand_is_exact_for_full_strips() {
        let segments = striped();
        let groups = normalize_to_25(compress(segments.as_slice()));
        assert_eq!(counts(&groups), vec![5, 10, 10]);
        assert_eq!(expand(&groups), segments);

        let mut alternating = SegmentColors::uniform(RED);
        for i in (0..SEGMENT_COUNT).step_by(2) {
            alternating.set(i, BLUE).unwrap();
        }
        let groups = normalize_to_25(compress(alternating.as_slice()));
        assert_eq!(groups.len(), 25);
        assert_eq!(expand(&groups), alternating);
    }

    #[test]
    fn normalize_extends_last_group() {
        let groups = normalize_to_25(vec![ColorGroup::new(RED, 3), ColorGroup::new(BLUE, 2)]);
        assert_eq!(counts(&groups), vec![3, 22]);
    }

    #[test]
    fn normalize_shrinks_last_group() {
        let groups = normalize_to_25(vec![ColorGroup::new(RED, 20), ColorGroup::new(BLUE, 10)]);
        assert_eq!(counts(&groups), vec![20, 5]);
    }

    #[test]
    fn normalize_drops_groups_from_the_end() {
        let groups = normalize_to_25(vec![
            ColorGroup::new(RED, 24),
            ColorGroup::new(GREEN, 1),
            ColorGroup::new(BLUE, 1),
        ]);
        assert_eq!(counts(&groups), vec![24, 1]);

        let groups = normalize_to_25(vec![
            ColorGroup::new(RED, 20),
            ColorGroup::new(GREEN, 10),
            ColorGroup::new(BLUE, 3),
        ]);
        assert_eq!(counts(&groups), vec![20, 5]);
    }

    #[test]
    fn normalize_empty_yields_white_strip() {
        let groups = normalize_to_25(Vec::new());
        assert_eq!(groups, vec![ColorGroup::new(RgbColor::WHITE, 25)]);
    }

    #[test]
    fn expand_pads_with_last_color_and_truncates() {
        let short = expand(&[ColorGroup::new(RED, 2), ColorGroup::new(GREEN, 1)]);
        assert_eq!(short[0], RED);
        assert_eq!(short[2], GREEN);
        assert_eq!(short[24], GREEN);

        let long = expand(&[ColorGroup::new(RED, 20), ColorGroup::new(BLUE, 20)]);
        assert_eq!(long[19], RED);
        assert_eq!(long[24], BLUE);

        assert_eq!(expand(&[]), SegmentColors::uniform(RgbColor::WHITE));
    }

    #[test]
    fn set_rejects_out_of_range_index() {
        let mut segments = SegmentColors::default();
        assert_eq!(segments.set(25, RED), Err(ValueError::SegmentIndex(25)));
        segments.set(24, RED).unwrap();
        assert_eq!(segments.get(24), Some(RED));
        assert_eq!(segments.get(25), None);
    }
}
