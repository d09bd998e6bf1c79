// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Provisioned device records.

use serde::{Deserialize, Deserializer};

use crate::error::ParseError;
use crate::state::{DeviceReport, LightState, power_flag};

/// Series marker of strips with 25 addressable segments.
const SEGMENTED_SERIES: &str = "S1-5";

/// One device from the account's device list.
///
/// Numeric ids are accepted and kept as strings. The optional property
/// fields seed the controller's initial state.
///
/// # Examples
///
/// ```
/// use lepro_lib::account::DeviceInfo;
///
/// let info: DeviceInfo =
///     serde_json::from_str(r#"{"did":1234567,"series":"S1-5 Strip","switch":1}"#).unwrap();
/// assert_eq!(info.did, "1234567");
/// assert!(info.is_segmented());
/// assert!(info.initial_state().is_on());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Device id used in topics.
    #[serde(deserialize_with = "string_or_number")]
    pub did: String,
    /// User-facing name.
    #[serde(default)]
    pub name: Option<String>,
    /// Family id.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub fid: Option<String>,
    /// Product series, e.g. `S1-5`.
    #[serde(default)]
    pub series: Option<String>,
    /// Last known power.
    #[serde(default, deserialize_with = "power_flag")]
    pub switch: Option<bool>,
    /// Last known mode.
    #[serde(default)]
    pub d2: Option<u8>,
    /// Last known grouped string.
    #[serde(default)]
    pub d50: Option<String>,
    /// Last known device-domain brightness.
    #[serde(default)]
    pub d52: Option<u16>,
    /// Last known special effect string.
    #[serde(default)]
    pub d60: Option<String>,
}

impl DeviceInfo {
    /// Creates a record with only an id.
    #[must_use]
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            ..Self::default()
        }
    }

    /// Sets the series.
    #[must_use]
    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    /// Returns `true` for strips whose segments are exposed individually.
    #[must_use]
    pub fn is_segmented(&self) -> bool {
        self.series
            .as_deref()
            .is_some_and(|series| series.contains(SEGMENTED_SERIES))
    }

    /// Builds the starting state from the record's property fields.
    ///
    /// Absent fields keep the [`LightState`] defaults.
    #[must_use]
    pub fn initial_state(&self) -> LightState {
        let mut state = LightState::new();
        state.apply_report(&DeviceReport::from(self));
        state
    }

    /// Parses the provisioning response `{"data":{"list":[...]}}`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the body is not a device list.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, ParseError> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            data: Data,
        }

        #[derive(Default, Deserialize)]
        struct Data {
            #[serde(default)]
            list: Vec<DeviceInfo>,
        }

        let body: Body = serde_json::from_str(json)?;
        Ok(body.data.list)
    }
}

impl From<&DeviceInfo> for DeviceReport {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            power: info.switch,
            mode: info.d2,
            d50: info.d50.clone(),
            brightness: info.d52,
            d60: info.d60.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Number(u64),
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        match id {
            Id::Text(text) => text,
            Id::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Id::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Id>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Effect, RgbColor};

    #[test]
    fn parse_list_with_mixed_ids() {
        let json = r#"{"code":0,"data":{"list":[
            {"did":"abc","name":"Desk","fid":12,"series":"S1-5","switch":0},
            {"did":42,"series":"B1"}
        ]}}"#;
        let devices = DeviceInfo::parse_list(json).unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].did, "abc");
        assert_eq!(devices[0].fid.as_deref(), Some("12"));
        assert_eq!(devices[0].switch, Some(false));
        assert!(devices[0].is_segmented());
        assert_eq!(devices[1].did, "42");
        assert!(!devices[1].is_segmented());
    }

    #[test]
    fn parse_list_without_data_is_empty() {
        assert!(DeviceInfo::parse_list(r#"{"code":401}"#).unwrap().is_empty());
        assert!(DeviceInfo::parse_list("not json").is_err());
    }

    #[test]
    fn initial_state_uses_property_fields() {
        let info: DeviceInfo = serde_json::from_str(
            r#"{"did":"1","switch":true,"d2":2,"d52":501,
                "d50":"N01:P10001FF0000F2100010019U3V300164013CE1;"}"#,
        )
        .unwrap();
        let state = info.initial_state();

        assert!(state.is_on());
        assert_eq!(state.brightness(), 127);
        assert_eq!(state.primary_color(), RgbColor::new(255, 0, 0));
        assert_eq!(state.effect(), Effect::Clockwise);
        assert_eq!(state.speed(), 10);
    }

    #[test]
    fn bare_record_keeps_defaults() {
        let state = DeviceInfo::new("1").initial_state();
        assert_eq!(state, LightState::new());
    }
}
