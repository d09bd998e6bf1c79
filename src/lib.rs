// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Lepro` Lib - A Rust library to control Lepro segmented LED strips over MQTT.
//!
//! This library tracks the state of Lepro strips, encodes state changes into
//! the device property protocol and keeps one broker session per account.
//!
//! # Supported Features
//!
//! - **Light control**: Power, brightness, 25 per-segment colors
//! - **Effects**: Grouped effects (`d50`) with speed, special effects (`d60`)
//!   with sensitivity
//! - **State sync**: Inbound reports applied to tracked state, observers
//!   notified with snapshots
//! - **Session**: Operations issued while offline are queued and replayed in
//!   order once the broker connection is up
//!
//! # Quick Start
//!
//! ```no_run
//! use lepro_lib::{Account, DeviceInfo, SessionConfig, TlsContext, TurnOnPatch};
//! use lepro_lib::types::{Effect, RgbColor};
//!
//! #[tokio::main]
//! async fn main() -> lepro_lib::Result<()> {
//!     let config = SessionConfig::builder()
//!         .host("broker.example.com")
//!         .client_suffix("0123456789")
//!         .tls(TlsContext::new(std::fs::read("root_ca.pem").unwrap_or_default()))
//!         .build()?;
//!
//!     let account = Account::new(config, vec![DeviceInfo::new("1234567").with_series("S1-5")]);
//!     account.start().await?;
//!
//!     let strip = account.controller("1234567")?;
//!     strip
//!         .turn_on(TurnOnPatch::new().with_color(RgbColor::new(255, 80, 0)))
//!         .await?;
//!     strip.set_effect(Effect::Breath).await?;
//!     strip.set_speed(75).await?;
//!
//!     // Paint the last segment blue
//!     account.segments("1234567")?[24]
//!         .set_color(RgbColor::new(0, 0, 255))
//!         .await?;
//!
//!     account.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## State Callbacks
//!
//! ```no_run
//! use lepro_lib::{LightController, Subscribable};
//!
//! # fn example(strip: &LightController) {
//! strip.on_state_changed(|state| {
//!     println!("on={} brightness={}", state.is_on(), state.brightness());
//! });
//! # }
//! ```

pub mod account;
pub mod codec;
pub mod command;
pub mod error;
pub mod light;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use account::{Account, DeviceInfo};
pub use command::{Command, DeviceCommand, StateQuery};
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use light::{Light, LightController, SegmentLight, TurnOnPatch};
pub use protocol::{ConnectionState, Delivery, SessionConfig, SessionManager, TlsContext};
pub use state::{DeviceReport, LightState};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{Effect, Mode, RgbColor, SegmentColors};
