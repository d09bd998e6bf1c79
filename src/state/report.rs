// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound property reports.

use serde::{Deserialize, Deserializer};

/// A partial device state report.
///
/// Every field is optional; unknown properties (`d3`, `online`, ...) are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceReport {
    /// Power (`d1`), sent as `0`/`1` or as a boolean.
    #[serde(rename = "d1", default, deserialize_with = "power_flag")]
    pub power: Option<bool>,
    /// Device mode (`d2`).
    #[serde(rename = "d2", default)]
    pub mode: Option<u8>,
    /// Grouped color/effect string.
    #[serde(default)]
    pub d50: Option<String>,
    /// Device-domain brightness (`d52`, 0-1000).
    #[serde(rename = "d52", default)]
    pub brightness: Option<u16>,
    /// Special effect string.
    #[serde(default)]
    pub d60: Option<String>,
}

impl DeviceReport {
    /// Returns `true` if the report carries no known property.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.power.is_none()
            && self.mode.is_none()
            && self.d50.is_none()
            && self.brightness.is_none()
            && self.d60.is_none()
    }
}

/// Report wrapper as published by the device: `{"d": {...}}`.
///
/// The envelope's `id` and `t` fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportEnvelope {
    /// The reported properties.
    #[serde(default)]
    pub d: DeviceReport,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
}

pub(crate) fn power_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(on) => on,
        Flag::Number(n) => n != 0,
    }))
}
