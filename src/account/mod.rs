// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-account context.
//!
//! An [`Account`] owns the session shared by all of an account's strips, one
//! [`LightController`] per provisioned device and, for segmented series, the
//! 25 [`SegmentLight`] views of each strip. It is the single ingestion point
//! for inbound reports.
//!
//! # Examples
//!
//! ```no_run
//! use lepro_lib::account::{Account, DeviceInfo};
//! use lepro_lib::protocol::SessionConfig;
//!
//! # async fn example(device_list_json: &str) -> lepro_lib::Result<()> {
//! let config = SessionConfig::builder()
//!     .host("broker.example.com")
//!     .client_suffix("0123456789")
//!     .build()?;
//! let devices = DeviceInfo::parse_list(device_list_json)?;
//!
//! let account = Account::new(config, devices);
//! account.start().await?;
//!
//! for light in account.controllers() {
//!     println!("{} on={}", light.device_id(), light.is_on());
//! }
//!
//! account.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod device_info;

pub use device_info::DeviceInfo;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::error::{Error, ParseError};
use crate::light::{LightController, SegmentLight};
use crate::protocol::{
    InboundMessage, MqttTransport, SessionConfig, SessionManager, Topic, Transport, app_exec_topic,
    property_filter,
};
use crate::state::ReportEnvelope;

struct Entry<T: Transport> {
    info: DeviceInfo,
    controller: LightController<T>,
    segments: Vec<SegmentLight<T>>,
}

struct AccountInner<T: Transport> {
    namespace: String,
    client_suffix: String,
    session: SessionManager<T>,
    /// Provisioning order.
    order: Vec<String>,
    entries: HashMap<String, Entry<T>>,
}

impl<T: Transport> AccountInner<T> {
    fn ingest(&self, message: &InboundMessage) -> crate::Result<()> {
        match Topic::parse(&self.namespace, &message.topic) {
            Some(Topic::Property { device_id, kind }) => {
                let Some(entry) = self.entries.get(device_id) else {
                    tracing::debug!(device_id, "Report for unknown device, ignoring");
                    return Ok(());
                };
                let envelope: ReportEnvelope = serde_json::from_str(&message.payload)
                    .map_err(ParseError::from)?;
                if envelope.d.is_empty() {
                    tracing::debug!(device_id, ?kind, "Report carries no known property");
                    return Ok(());
                }
                entry.controller.apply_report(&envelope.d);
                Ok(())
            }
            Some(Topic::AppExec { client_suffix }) => {
                tracing::debug!(client_suffix, payload = %message.payload, "App-exec message ignored");
                Ok(())
            }
            None => {
                tracing::trace!(topic = %message.topic, "Unrelated topic ignored");
                Ok(())
            }
        }
    }
}

/// Session, controllers and segment views of one account.
///
/// Cheap to clone; clones share everything.
pub struct Account<T: Transport = MqttTransport> {
    inner: Arc<AccountInner<T>>,
}

impl<T: Transport> Clone for Account<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Account<MqttTransport> {
    /// Creates an account over MQTT.
    ///
    /// Nothing connects until [`start`](Self::start).
    #[must_use]
    pub fn new(config: SessionConfig, devices: Vec<DeviceInfo>) -> Self {
        let namespace = config.namespace().to_string();
        let client_suffix = config.client_suffix().to_string();
        Self::with_session(SessionManager::new(config), namespace, client_suffix, devices)
    }
}

impl<T: Transport> Account<T> {
    /// Creates an account over an existing session.
    ///
    /// Each device gets a controller seeded from its record. A later record
    /// with an already seen id replaces the earlier one.
    #[must_use]
    pub fn with_session(
        session: SessionManager<T>,
        namespace: impl Into<String>,
        client_suffix: impl Into<String>,
        devices: Vec<DeviceInfo>,
    ) -> Self {
        let namespace = namespace.into();
        let mut order = Vec::with_capacity(devices.len());
        let mut entries = HashMap::with_capacity(devices.len());

        for info in devices {
            let controller = LightController::with_state(
                info.did.clone(),
                namespace.clone(),
                session.clone(),
                info.initial_state(),
            );
            let segments = if info.is_segmented() {
                controller.segments()
            } else {
                Vec::new()
            };
            tracing::debug!(
                device_id = %info.did,
                segments = segments.len(),
                "Registered device"
            );

            let did = info.did.clone();
            let entry = Entry {
                info,
                controller,
                segments,
            };
            if entries.insert(did.clone(), entry).is_some() {
                tracing::warn!(device_id = %did, "Duplicate device id, keeping the last record");
            } else {
                order.push(did);
            }
        }

        Self {
            inner: Arc::new(AccountInner {
                namespace,
                client_suffix: client_suffix.into(),
                session,
                order,
                entries,
            }),
        }
    }

    /// Registers the inbound handler, subscribes every topic the account
    /// needs and asks each device for its state.
    ///
    /// Operations issued before the connection is up are queued and replayed
    /// once it is.
    ///
    /// # Errors
    ///
    /// Returns an error if a state query cannot be serialized.
    pub async fn start(&self) -> crate::Result<()> {
        let weak: Weak<AccountInner<T>> = Arc::downgrade(&self.inner);
        self.inner.session.set_message_handler(move |message| match weak.upgrade() {
            Some(inner) => inner.ingest(message),
            None => Ok(()),
        });

        let inner = &self.inner;
        inner
            .session
            .subscribe(app_exec_topic(&inner.namespace, &inner.client_suffix))
            .await;
        for did in &inner.order {
            inner
                .session
                .subscribe(property_filter(&inner.namespace, did))
                .await;
        }
        for light in self.controllers() {
            light.request_refresh().await?;
        }

        tracing::info!(
            devices = inner.order.len(),
            state = ?inner.session.connection_state(),
            "Account started"
        );
        Ok(())
    }

    /// Applies one inbound message.
    ///
    /// Device reports update the matching controller. Reports for unknown
    /// devices, app-exec messages and unrelated topics are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if a device report is not valid JSON.
    pub fn ingest(&self, message: &InboundMessage) -> crate::Result<()> {
        self.inner.ingest(message)
    }

    /// Returns the shared session.
    #[must_use]
    pub fn session(&self) -> &SessionManager<T> {
        &self.inner.session
    }

    /// Returns the controller of device `did`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the account has no such device.
    pub fn controller(&self, did: &str) -> crate::Result<&LightController<T>> {
        self.inner
            .entries
            .get(did)
            .map(|entry| &entry.controller)
            .ok_or_else(|| Error::DeviceNotFound(did.to_string()))
    }

    /// Returns the segment views of device `did`; empty for strips that are
    /// not segmented.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the account has no such device.
    pub fn segments(&self, did: &str) -> crate::Result<&[SegmentLight<T>]> {
        self.inner
            .entries
            .get(did)
            .map(|entry| entry.segments.as_slice())
            .ok_or_else(|| Error::DeviceNotFound(did.to_string()))
    }

    /// Returns the record device `did` was created from.
    #[must_use]
    pub fn device(&self, did: &str) -> Option<&DeviceInfo> {
        self.inner.entries.get(did).map(|entry| &entry.info)
    }

    /// Iterates over the controllers in provisioning order.
    pub fn controllers(&self) -> impl Iterator<Item = &LightController<T>> {
        self.inner
            .order
            .iter()
            .filter_map(|did| self.inner.entries.get(did))
            .map(|entry| &entry.controller)
    }

    /// Disconnects the session. Queued operations are kept.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down account session");
        self.inner.session.disconnect().await;
    }
}

impl<T: Transport> std::fmt::Debug for Account<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("namespace", &self.inner.namespace)
            .field("client_suffix", &self.inner.client_suffix)
            .field("devices", &self.inner.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ConnectionState;
    use crate::protocol::testing::{FakeTransport, eventually};
    use crate::types::RgbColor;

    fn account(devices: Vec<DeviceInfo>) -> (Account<FakeTransport>, FakeTransport) {
        let transport = FakeTransport::new();
        transport.open_gate();
        let session = SessionManager::with_transport(transport.clone());
        (
            Account::with_session(session, "le", "sfx", devices),
            transport,
        )
    }

    fn devices() -> Vec<DeviceInfo> {
        vec![
            DeviceInfo::new("strip").with_series("S1-5"),
            DeviceInfo::new("bulb"),
        ]
    }

    #[tokio::test]
    async fn start_subscribes_and_requests_state() {
        let (account, transport) = account(devices());
        account.start().await.unwrap();

        eventually(|| account.session().connection_state() == ConnectionState::Connected).await;
        assert_eq!(
            transport.subscribed(),
            vec!["le/sfx/act/app/exe", "le/strip/prp/#", "le/bulb/prp/#"]
        );
        let topics: Vec<String> = transport.published().into_iter().map(|(t, _)| t).collect();
        assert_eq!(topics, vec!["le/strip/prp/get", "le/bulb/prp/get"]);
    }

    #[tokio::test]
    async fn inbound_reports_reach_the_controller() {
        let (account, transport) = account(devices());
        account.start().await.unwrap();
        eventually(|| account.session().is_connected()).await;
        transport.clear_ops();

        transport.inject("le/bulb/prp/rpt", r#"{"id":1,"t":2,"d":{"d1":1,"d52":501}}"#);
        eventually(|| account.controller("bulb").unwrap().is_on()).await;
        assert_eq!(account.controller("bulb").unwrap().brightness(), 127);
        assert!(!account.controller("strip").unwrap().is_on());
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn unreadable_d50_does_not_stop_later_reports() {
        let (account, transport) = account(devices());
        account.start().await.unwrap();
        eventually(|| account.session().is_connected()).await;

        transport.inject(
            "le/strip/prp/rpt",
            r#"{"d":{"d1":1,"d50":"N01:P10002FF000000FF00F210002000é000U3V3000640000E1;"}}"#,
        );
        transport.inject("le/bulb/prp/rpt", r#"{"d":{"d1":1}}"#);
        eventually(|| account.controller("bulb").unwrap().is_on()).await;

        let strip = account.controller("strip").unwrap();
        assert!(strip.is_on());
        assert_eq!(strip.primary_color(), RgbColor::WHITE);
        assert!(account.session().is_connected());
    }

    #[test]
    fn ingest_ignores_unknown_devices_and_app_exec() {
        let (account, _transport) = account(devices());

        let unknown = InboundMessage::new("le/other/prp/rpt", r#"{"d":{"d1":1}}"#);
        assert!(account.ingest(&unknown).is_ok());

        let app = InboundMessage::new("le/sfx/act/app/exe", "anything");
        assert!(account.ingest(&app).is_ok());

        let unrelated = InboundMessage::new("zz/strip/prp/rpt", "not json");
        assert!(account.ingest(&unrelated).is_ok());
    }

    #[test]
    fn ingest_reports_malformed_json() {
        let (account, _transport) = account(devices());
        let bad = InboundMessage::new("le/strip/prp/getr", "{not json");
        assert!(matches!(
            account.ingest(&bad),
            Err(Error::Parse(ParseError::Json(_)))
        ));
    }

    #[test]
    fn segmented_series_get_segment_views() {
        let (account, _transport) = account(devices());
        assert_eq!(account.segments("strip").unwrap().len(), 25);
        assert!(account.segments("bulb").unwrap().is_empty());
        assert!(matches!(
            account.segments("nope"),
            Err(Error::DeviceNotFound(did)) if did == "nope"
        ));
        assert!(account.device("strip").unwrap().is_segmented());
    }

    #[test]
    fn controllers_start_from_device_records() {
        let mut info = DeviceInfo::new("strip");
        info.switch = Some(true);
        info.d50 = Some("N01:P10001FF0000F2100010019U3V3000640000E1;".to_string());
        let (account, _transport) = account(vec![info, DeviceInfo::new("bulb")]);

        let light = account.controller("strip").unwrap();
        assert!(light.is_on());
        assert_eq!(light.primary_color(), RgbColor::new(255, 0, 0));

        let ids: Vec<&str> = account.controllers().map(|light| light.device_id()).collect();
        assert_eq!(ids, vec!["strip", "bulb"]);
    }

    #[test]
    fn duplicate_ids_keep_last_record() {
        let (account, _transport) = account(vec![
            DeviceInfo::new("a").with_series("S1-5"),
            DeviceInfo::new("a"),
        ]);
        assert_eq!(account.controllers().count(), 1);
        assert!(account.segments("a").unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_disconnects_session() {
        let (account, _transport) = account(devices());
        account.start().await.unwrap();
        eventually(|| account.session().is_connected()).await;

        account.shutdown().await;
        assert_eq!(
            account.session().connection_state(),
            ConnectionState::Disconnected
        );
    }
}
