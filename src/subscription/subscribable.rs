// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for lights that publish state snapshots.

use crate::state::LightState;
use crate::subscription::SubscriptionId;

/// Trait for types that support state subscriptions.
///
/// # Examples
///
/// ```no_run
/// use lepro_lib::subscription::Subscribable;
/// # use lepro_lib::LightController;
///
/// # fn example(light: &LightController) {
/// let id = light.on_state_changed(|state| {
///     println!("brightness {}", state.brightness());
/// });
/// assert!(light.unsubscribe(id));
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to state changes.
    ///
    /// The callback receives the full snapshot after every change.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LightState) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
