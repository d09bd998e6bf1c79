// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker session and topic layout.
//!
//! # Components
//!
//! - [`SessionConfig`]: broker address, client identity, TLS material
//! - [`Transport`]: seam between the session and a concrete client;
//!   [`MqttTransport`] implements it with `rumqttc`
//! - [`SessionManager`]: durable session that queues operations while
//!   disconnected and replays them on connect
//! - [`Topic`]: parser for inbound topics, plus builders for outbound ones

mod config;
mod session;
#[cfg(test)]
pub(crate) mod testing;
mod topic;
mod transport;

pub use config::{SessionConfig, SessionConfigBuilder, TlsContext};
pub use session::{ConnectionState, Delivery, MessageHandler, SessionManager};
pub use topic::{ReportKind, Topic, app_exec_topic, property_filter, property_topic};
pub use transport::{
    InboundMessage, MqttClient, MqttEvents, MqttTransport, Transport, TransportClient,
    TransportEvents,
};
