// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic layout.
//!
//! ```text
//! <ns>/<device-id>/prp/set       outbound command, echoed back inbound
//! <ns>/<device-id>/prp/get       outbound state query
//! <ns>/<device-id>/prp/rpt       inbound spontaneous report
//! <ns>/<device-id>/prp/getr      inbound query reply
//! <ns>/<client-suffix>/act/app/exe   inbound app-exec channel
//! ```

/// Kind of inbound property message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// `rpt`: spontaneous state report.
    Report,
    /// `set`: echo of a property-set command.
    Set,
    /// `getr`: reply to a state query.
    GetReply,
}

impl ReportKind {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "rpt" => Some(Self::Report),
            "set" => Some(Self::Set),
            "getr" => Some(Self::GetReply),
            _ => None,
        }
    }
}

/// A parsed inbound topic.
///
/// # Examples
///
/// ```
/// use lepro_lib::protocol::{ReportKind, Topic};
///
/// assert_eq!(
///     Topic::parse("le", "le/12345/prp/rpt"),
///     Some(Topic::Property { device_id: "12345", kind: ReportKind::Report })
/// );
/// assert_eq!(Topic::parse("le", "le/12345/prp/get"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic<'a> {
    /// A device property report.
    Property {
        /// Device id (second topic level).
        device_id: &'a str,
        /// Report kind.
        kind: ReportKind,
    },
    /// The app-exec channel of a client.
    AppExec {
        /// Client suffix (second topic level).
        client_suffix: &'a str,
    },
}

impl<'a> Topic<'a> {
    /// Parses `topic` under `namespace`. Unrelated topics yield `None`.
    #[must_use]
    pub fn parse(namespace: &str, topic: &'a str) -> Option<Self> {
        let parts: Vec<&'a str> = topic.split('/').collect();
        match parts.as_slice() {
            [ns, device_id, "prp", kind] if *ns == namespace && !device_id.is_empty() => {
                Some(Self::Property {
                    device_id: *device_id,
                    kind: ReportKind::parse(kind)?,
                })
            }
            [ns, client_suffix, "act", "app", "exe"] if *ns == namespace => {
                Some(Self::AppExec {
                    client_suffix: *client_suffix,
                })
            }
            _ => None,
        }
    }
}

/// `<ns>/<device-id>/prp/<action>`.
#[must_use]
pub fn property_topic(namespace: &str, device_id: &str, action: &str) -> String {
    format!("{namespace}/{device_id}/prp/{action}")
}

/// `<ns>/<device-id>/prp/#`, covering every inbound report of a device.
#[must_use]
pub fn property_filter(namespace: &str, device_id: &str) -> String {
    property_topic(namespace, device_id, "#")
}

/// `<ns>/<client-suffix>/act/app/exe`.
#[must_use]
pub fn app_exec_topic(namespace: &str, client_suffix: &str) -> String {
    format!("{namespace}/{client_suffix}/act/app/exe")
}
