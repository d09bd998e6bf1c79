// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for light state changes.
//!
//! Observers (a host UI registry, segment views, tests) register a callback
//! and receive a [`LightState`](crate::state::LightState) snapshot every time
//! a controller's state is marked dirty: after each command and after each
//! inbound report that changed something.
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Registry that stores callbacks and dispatches snapshots
//! - [`Subscribable`] - Trait for types that support state subscriptions
//!
//! # Usage
//!
//! ```no_run
//! use lepro_lib::subscription::Subscribable;
//! # use lepro_lib::LightController;
//!
//! # fn example(light: LightController) {
//! let sub_id = light.on_state_changed(|state| {
//!     println!("on={} effect={}", state.is_on(), state.effect());
//! });
//!
//! // Later, unsubscribe
//! light.unsubscribe(sub_id);
//! # }
//! ```

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
