// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broker session configuration.

use std::time::Duration;

use rumqttc::{MqttOptions, QoS, TlsConfiguration};

use crate::error::ProtocolError;

/// Prefix of the client identifier presented to the broker.
const CLIENT_ID_PREFIX: &str = "lepro-app-";

/// PEM material for a mutually authenticated TLS connection.
///
/// Provisioning (certificate download, key storage) happens outside this
/// crate; the session only consumes the resulting bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsContext {
    ca: Vec<u8>,
    client_auth: Option<(Vec<u8>, Vec<u8>)>,
}

impl TlsContext {
    /// Creates a context trusting the given CA certificate (PEM).
    #[must_use]
    pub fn new(ca_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            ca: ca_pem.into(),
            client_auth: None,
        }
    }

    /// Adds a client certificate and private key (both PEM).
    #[must_use]
    pub fn with_client_auth(
        mut self,
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
    ) -> Self {
        self.client_auth = Some((cert_pem.into(), key_pem.into()));
        self
    }

    /// Returns `true` if a client certificate is configured.
    #[must_use]
    pub const fn has_client_auth(&self) -> bool {
        self.client_auth.is_some()
    }

    fn to_tls_configuration(&self) -> TlsConfiguration {
        TlsConfiguration::Simple {
            ca: self.ca.clone(),
            alpn: None,
            client_auth: self.client_auth.clone(),
        }
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("ca_len", &self.ca.len())
            .field("client_auth", &self.has_client_auth())
            .finish()
    }
}

/// Configuration for one account's broker session.
///
/// # Examples
///
/// ```
/// use lepro_lib::protocol::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .host("broker.example.com")
///     .client_suffix("0123456789abcdef")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.port(), 8883);
/// assert_eq!(config.client_id(), "lepro-app-0123456789abcdef");
/// assert_eq!(config.namespace(), "le");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    host: String,
    port: u16,
    client_suffix: String,
    namespace: String,
    keep_alive: Duration,
    qos: QoS,
    request_capacity: usize,
    tls: Option<TlsContext>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8883,
            client_suffix: String::new(),
            namespace: "le".to_string(),
            keep_alive: Duration::from_secs(30),
            qos: QoS::AtLeastOnce,
            request_capacity: 64,
            tls: None,
        }
    }
}

impl SessionConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the per-installation client suffix.
    #[must_use]
    pub fn client_suffix(&self) -> &str {
        &self.client_suffix
    }

    /// Returns the MQTT client identifier, `lepro-app-<suffix>`.
    #[must_use]
    pub fn client_id(&self) -> String {
        format!("{CLIENT_ID_PREFIX}{}", self.client_suffix)
    }

    /// Returns the topic namespace (first topic level).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub const fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns the QoS used for subscriptions and publications.
    #[must_use]
    pub const fn qos(&self) -> QoS {
        self.qos
    }

    /// Returns the capacity of the client request channel.
    #[must_use]
    pub const fn request_capacity(&self) -> usize {
        self.request_capacity
    }

    /// Returns the TLS context, if any.
    #[must_use]
    pub const fn tls(&self) -> Option<&TlsContext> {
        self.tls.as_ref()
    }

    /// Builds the `rumqttc` options for this configuration.
    #[must_use]
    pub fn to_mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id(), &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some(tls) = &self.tls {
            options.set_transport(rumqttc::Transport::Tls(tls.to_tls_configuration()));
        }
        options
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Sets the broker host address (required).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 8883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the client suffix (required).
    #[must_use]
    pub fn client_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.client_suffix = suffix.into();
        self
    }

    /// Sets the topic namespace (default: `le`).
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the QoS (default: at least once).
    #[must_use]
    pub fn qos(mut self, qos: QoS) -> Self {
        self.config.qos = qos;
        self
    }

    /// Sets the client request channel capacity (default: 64).
    #[must_use]
    pub fn request_capacity(mut self, capacity: usize) -> Self {
        self.config.request_capacity = capacity.max(1);
        self
    }

    /// Enables TLS with the given context.
    #[must_use]
    pub fn tls(mut self, tls: TlsContext) -> Self {
        self.config.tls = Some(tls);
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the host or the client
    /// suffix is missing.
    pub fn build(self) -> Result<SessionConfig, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }
        if self.config.client_suffix.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT client suffix is required".to_string(),
            ));
        }
        Ok(self.config)
    }
}
