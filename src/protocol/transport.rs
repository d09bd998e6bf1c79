// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publish/subscribe transport seam.
//!
//! A [`Transport`] performs the connection handshake and splits the result
//! into a cloneable [`TransportClient`] for outbound requests and a
//! [`TransportEvents`] stream of inbound messages. [`MqttTransport`] is the
//! `rumqttc` implementation used in production.

use std::future::Future;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Packet, QoS};

use crate::error::ProtocolError;

use super::SessionConfig;

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message was published to.
    pub topic: String,
    /// UTF-8 payload.
    pub payload: String,
}

impl InboundMessage {
    /// Creates a new inbound message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Opens connections to a broker.
pub trait Transport: Send + Sync + 'static {
    /// Handle for outbound requests.
    type Client: TransportClient;
    /// Stream of inbound messages.
    type Events: TransportEvents;

    /// Connects and completes the protocol handshake.
    ///
    /// Has no timeout of its own: a stalled handshake stalls the caller.
    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Client, Self::Events), ProtocolError>> + Send;
}

/// Outbound half of a connection.
pub trait TransportClient: Clone + Send + Sync + 'static {
    /// Subscribes to a topic filter.
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Publishes a payload.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

/// Inbound half of a connection.
pub trait TransportEvents: Send + 'static {
    /// Waits for the next inbound message.
    ///
    /// Returns `Ok(None)` when the broker closes the connection cleanly.
    fn recv(&mut self) -> impl Future<Output = Result<Option<InboundMessage>, ProtocolError>> + Send;
}

/// `rumqttc`-backed transport.
#[derive(Debug, Clone)]
pub struct MqttTransport {
    config: SessionConfig,
}

impl MqttTransport {
    /// Creates a transport for the given configuration.
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Transport for MqttTransport {
    type Client = MqttClient;
    type Events = MqttEvents;

    async fn connect(&self) -> Result<(MqttClient, MqttEvents), ProtocolError> {
        let options = self.config.to_mqtt_options();
        let (client, mut event_loop) = AsyncClient::new(options, self.config.request_capacity());

        tracing::debug!(
            host = %self.config.host(),
            port = %self.config.port(),
            client_id = %self.config.client_id(),
            "Connecting to MQTT broker"
        );

        loop {
            match event_loop.poll().await? {
                Event::Incoming(Packet::ConnAck(connack)) => {
                    if connack.code != ConnectReturnCode::Success {
                        return Err(ProtocolError::ConnectionFailed(format!(
                            "broker refused connection: {:?}",
                            connack.code
                        )));
                    }
                    tracing::info!(
                        host = %self.config.host(),
                        port = %self.config.port(),
                        "Connected to MQTT broker"
                    );
                    break;
                }
                other => tracing::trace!(event = ?other, "MQTT event before ConnAck"),
            }
        }

        Ok((
            MqttClient {
                client,
                qos: self.config.qos(),
            },
            MqttEvents { event_loop },
        ))
    }
}

/// Outbound half of an MQTT connection.
#[derive(Debug, Clone)]
pub struct MqttClient {
    client: AsyncClient,
    qos: QoS,
}

impl TransportClient for MqttClient {
    async fn subscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        self.client.subscribe(topic, self.qos).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        self.client
            .publish(topic, self.qos, false, payload.as_bytes().to_vec())
            .await?;
        Ok(())
    }
}

/// Inbound half of an MQTT connection.
pub struct MqttEvents {
    event_loop: EventLoop,
}

impl std::fmt::Debug for MqttEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttEvents").finish_non_exhaustive()
    }
}

impl TransportEvents for MqttEvents {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, ProtocolError> {
        loop {
            match self.event_loop.poll().await? {
                Event::Incoming(Packet::Publish(publish)) => {
                    match String::from_utf8(publish.payload.to_vec()) {
                        Ok(payload) => {
                            tracing::debug!(
                                topic = %publish.topic,
                                payload = %payload,
                                "MQTT message received"
                            );
                            return Ok(Some(InboundMessage::new(publish.topic, payload)));
                        }
                        Err(_) => {
                            tracing::debug!(topic = %publish.topic, "Skipping non UTF-8 payload");
                        }
                    }
                }
                Event::Incoming(Packet::SubAck(suback)) => {
                    tracing::debug!(?suback, "MQTT subscription acknowledged");
                }
                Event::Incoming(Packet::Disconnect) => {
                    tracing::info!("MQTT broker disconnected");
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}
