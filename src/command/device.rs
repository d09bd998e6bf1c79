// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device property commands and their envelope.

use serde::Serialize;

use crate::error::ParseError;
use crate::types::Mode;

use super::Command;

/// Largest correlation id placed in an [`Envelope`].
const MAX_CORRELATION_ID: u128 = 1_000_000_000;

/// A property-set command.
///
/// Absent fields are omitted from the JSON object. Field order on the wire is
/// `d1, d2, d50, d60, d52`.
///
/// # Examples
///
/// ```
/// use lepro_lib::command::DeviceCommand;
///
/// let cmd = DeviceCommand::special("2000064320000".into(), 1000);
/// assert_eq!(
///     serde_json::to_string(&cmd).unwrap(),
///     r#"{"d1":1,"d2":3,"d60":"2000064320000","d52":1000}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCommand {
    /// Power: 1 on, 0 off.
    pub d1: u8,
    /// Device mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d2: Option<u8>,
    /// Grouped color/effect string (mode 2).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d50: Option<String>,
    /// Special effect string (mode 3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d60: Option<String>,
    /// Device-domain brightness (0-1000).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d52: Option<u16>,
}

impl DeviceCommand {
    /// Creates the minimal power-off command, `{"d1":0}`.
    #[must_use]
    pub const fn power_off() -> Self {
        Self {
            d1: 0,
            d2: None,
            d50: None,
            d60: None,
            d52: None,
        }
    }

    /// Creates a power-on command in grouped mode carrying a `d50` string.
    #[must_use]
    pub const fn grouped(d50: String, brightness: u16) -> Self {
        Self {
            d1: 1,
            d2: Some(Mode::Grouped.code()),
            d50: Some(d50),
            d60: None,
            d52: Some(brightness),
        }
    }

    /// Creates a power-on command in special mode carrying a `d60` string.
    #[must_use]
    pub const fn special(d60: String, brightness: u16) -> Self {
        Self {
            d1: 1,
            d2: Some(Mode::Special.code()),
            d50: None,
            d60: Some(d60),
            d52: Some(brightness),
        }
    }

    /// Returns `true` if this command powers the device on.
    #[must_use]
    pub const fn is_power_on(&self) -> bool {
        self.d1 != 0
    }
}

impl Command for DeviceCommand {
    fn action(&self) -> &'static str {
        "set"
    }

    fn to_payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(&Envelope::new(self))?)
    }
}

/// Wrapper carrying a random correlation id and a unix timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    /// Random correlation id in `0..=1_000_000_000`.
    pub id: u32,
    /// Unix timestamp in seconds.
    pub t: i64,
    /// The wrapped payload.
    pub d: T,
}

impl<T> Envelope<T> {
    /// Wraps `payload` with a fresh correlation id and the current time.
    #[must_use]
    pub fn new(payload: T) -> Self {
        let id = uuid::Uuid::new_v4().as_u128() % (MAX_CORRELATION_ID + 1);
        Self {
            id: u32::try_from(id).unwrap_or_default(),
            t: chrono::Utc::now().timestamp(),
            d: payload,
        }
    }
}
