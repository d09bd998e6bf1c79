// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `lepro_lib` library.
//!
//! Failures are split by origin: value validation, broker communication,
//! payload parsing, and lookups against an account's device list.
//!
//! Protocol decode errors are normally absorbed by the fail-soft decoders in
//! [`codec`](crate::codec); the [`ParseError`] values surface only through the
//! `try_*` decoder variants and JSON envelope parsing.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during broker communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No controller is registered for the given device id.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A segment proxy outlived the controller it points into.
    #[error("parent light controller has been dropped")]
    ControllerDropped,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A hex color string could not be parsed.
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),

    /// The effect name has no protocol mapping.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// Segment index outside `0..25`.
    #[error("segment index {0} is out of range [0, 24]")]
    SegmentIndex(usize),
}

/// Errors related to broker communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The MQTT client rejected a request (its event loop is gone).
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The MQTT connection failed or was lost.
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address or session configuration.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing device payloads and wire strings.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected token or field is missing.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Unexpected payload format.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
