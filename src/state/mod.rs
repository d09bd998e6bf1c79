// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light state and inbound device reports.
//!
//! [`LightState`] is the snapshot a controller owns. [`DeviceReport`] is the
//! partial update a device publishes on its `rpt`, `set` and `getr` topics;
//! applying one changes only the fields it carries.
//!
//! # Examples
//!
//! ```
//! use lepro_lib::state::{DeviceReport, LightState};
//! use lepro_lib::types::Effect;
//!
//! let mut state = LightState::new();
//! let report: DeviceReport = serde_json::from_str(r#"{"d1":1,"d2":3}"#).unwrap();
//!
//! assert!(state.apply_report(&report));
//! assert!(state.is_on());
//! // Mode 3 without a recognized special effect falls back to flash.
//! assert_eq!(state.effect(), Effect::Flash);
//! ```

mod light_state;
mod report;

pub use light_state::LightState;
pub use report::{DeviceReport, ReportEnvelope};
pub(crate) use report::power_flag;
