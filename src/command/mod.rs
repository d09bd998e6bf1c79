// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound device payloads.
//!
//! Every payload is published under the device's property namespace,
//! `<ns>/<device-id>/prp/<action>`.
//!
//! | Payload | Action | Body |
//! |---------|--------|------|
//! | [`DeviceCommand`] | `set` | `{"id":…,"t":…,"d":{"d1":…}}` |
//! | [`StateQuery`] | `get` | `{"d":["d1","d2",…]}` |
//!
//! # Examples
//!
//! ```
//! use lepro_lib::command::{Command, DeviceCommand};
//!
//! let cmd = DeviceCommand::power_off();
//! assert_eq!(cmd.action(), "set");
//!
//! let payload: serde_json::Value = serde_json::from_str(&cmd.to_payload().unwrap()).unwrap();
//! assert_eq!(payload["d"]["d1"], 0);
//! assert!(payload["id"].is_u64());
//! ```

mod device;
mod query;

pub use device::{DeviceCommand, Envelope};
pub use query::StateQuery;

use crate::error::ParseError;

/// A payload that can be published to a device.
pub trait Command {
    /// Returns the topic action under `<ns>/<device-id>/prp/`.
    fn action(&self) -> &'static str;

    /// Serializes the payload for publication.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    fn to_payload(&self) -> Result<String, ParseError>;
}
