// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full state query.

use serde::Serialize;

use crate::error::ParseError;

use super::Command;

/// Fields requested by a full refresh.
const REFRESH_FIELDS: [&str; 10] = [
    "d1", "d2", "d3", "d4", "d5", "d30", "d50", "d52", "d60", "online",
];

/// Asks a device to report a list of properties.
///
/// Unlike [`DeviceCommand`](super::DeviceCommand) the query is published
/// without an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateQuery {
    d: Vec<&'static str>,
}

impl StateQuery {
    /// Creates the query for every property a light reports.
    #[must_use]
    pub fn full() -> Self {
        Self {
            d: REFRESH_FIELDS.to_vec(),
        }
    }

    /// Returns the requested property names.
    #[must_use]
    pub fn fields(&self) -> &[&'static str] {
        &self.d
    }
}

impl Default for StateQuery {
    fn default() -> Self {
        Self::full()
    }
}

impl Command for StateQuery {
    fn action(&self) -> &'static str {
        "get"
    }

    fn to_payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_query_payload() {
        let query = StateQuery::full();
        assert_eq!(query.action(), "get");
        assert_eq!(
            query.to_payload().unwrap(),
            r#"{"d":["d1","d2","d3","d4","d5","d30","d50","d52","d60","online"]}"#
        );
        assert_eq!(query.fields().len(), 10);
    }
}
