// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire string codecs.
//!
//! The device describes its appearance through two densely packed ASCII
//! strings:
//!
//! - `d50` carries per-segment colors plus one grouped effect and its speed
//!   (device mode 2). See [`encode_d50`] and [`decode_d50`].
//! - `d60` carries one special effect and its audio sensitivity (device
//!   mode 3). See [`encode_d60`] and [`decode_d60`].
//!
//! Percentages travel as hex codes; the transforms live in this module too.
//! Decoders never fail loudly: the `decode_*` forms log and fall back to
//! defaults, while [`try_decode_d50`] exposes the underlying error.

mod d50;
mod d60;
mod numeric;

pub use d50::{DEFAULT_SPEED, GroupedState, decode_d50, encode_d50, try_decode_d50};
pub use d60::{DEFAULT_SENSITIVITY, decode_d60, effect_prefix, encode_d60};
pub use numeric::{
    DEVICE_BRIGHTNESS_MAX, SPEED_STOPPED_CODE, brightness_from_device, brightness_to_device,
    code_to_sensitivity, code_to_speed, sensitivity_to_code, speed_to_code,
};
