// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light controller owning one strip's state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::{Command, DeviceCommand, StateQuery};
use crate::error::ValueError;
use crate::protocol::{Delivery, MqttTransport, SessionManager, Transport, property_topic};
use crate::state::{DeviceReport, LightState};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{Effect, RgbColor, SEGMENT_COUNT, SegmentColors};

use super::{Light, SegmentLight, TurnOnPatch};

/// Shared by a controller, its clones and its segment views.
pub(super) struct ControllerInner<T: Transport> {
    device_id: String,
    namespace: String,
    session: SessionManager<T>,
    state: Mutex<LightState>,
    /// Serializes outbound commands.
    command_lock: tokio::sync::Mutex<()>,
    pub(super) callbacks: CallbackRegistry,
}

impl<T: Transport> ControllerInner<T> {
    pub(super) fn snapshot(&self) -> LightState {
        self.state.lock().clone()
    }

    pub(super) fn read<R>(&self, f: impl FnOnce(&LightState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Applies `mutate` to a copy of the state, commits it powered on and
    /// sends the matching command.
    ///
    /// A failing `mutate` leaves the state untouched and sends nothing.
    pub(super) async fn update<F>(&self, mutate: F) -> crate::Result<()>
    where
        F: FnOnce(&mut LightState) -> Result<(), ValueError>,
    {
        let _guard = self.command_lock.lock().await;

        let (command, snapshot) = {
            let mut state = self.state.lock();
            let mut next = state.clone();
            mutate(&mut next)?;
            next.set_on(true);
            let command = next.to_command();
            *state = next;
            (command, state.clone())
        };

        if let Some(command) = command {
            self.send(&command).await?;
        }
        self.callbacks.dispatch(&snapshot);
        Ok(())
    }

    /// Sends the power-off command. Colors, effect and speed are kept.
    pub(super) async fn power_off(&self) -> crate::Result<()> {
        let _guard = self.command_lock.lock().await;

        let snapshot = {
            let mut state = self.state.lock();
            state.set_on(false);
            state.clone()
        };

        self.send(&DeviceCommand::power_off()).await?;
        self.callbacks.dispatch(&snapshot);
        Ok(())
    }

    async fn send<C: Command>(&self, command: &C) -> crate::Result<Delivery> {
        let topic = property_topic(&self.namespace, &self.device_id, command.action());
        let payload = command.to_payload()?;
        tracing::debug!(device_id = %self.device_id, topic = %topic, payload = %payload, "Sending command");

        let delivery = self.session.publish(topic, payload).await;
        if delivery == Delivery::Queued {
            tracing::debug!(device_id = %self.device_id, "Session not connected, command queued");
        }
        Ok(delivery)
    }
}

/// Controller for one Lepro strip.
///
/// Holds the tracked [`LightState`], turns every change into a property
/// command and notifies observers with a fresh snapshot after each command
/// and after each inbound report that changed something.
///
/// Cheap to clone; clones share state, observers and session.
///
/// # Examples
///
/// ```no_run
/// use lepro_lib::light::{LightController, TurnOnPatch};
/// use lepro_lib::protocol::{SessionConfig, SessionManager};
/// use lepro_lib::types::RgbColor;
///
/// # async fn example() -> lepro_lib::Result<()> {
/// let config = SessionConfig::builder()
///     .host("broker.example.com")
///     .client_suffix("0123456789")
///     .build()?;
/// let light = LightController::new("1234567", "le", SessionManager::new(config));
///
/// light.turn_on(TurnOnPatch::new().with_color(RgbColor::new(255, 0, 0))).await?;
/// light.set_speed(80).await?;
/// light.turn_off().await?;
/// # Ok(())
/// # }
/// ```
pub struct LightController<T: Transport = MqttTransport> {
    inner: Arc<ControllerInner<T>>,
}

impl<T: Transport> Clone for LightController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> LightController<T> {
    /// Creates a controller with the default state (off, white, solid).
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        namespace: impl Into<String>,
        session: SessionManager<T>,
    ) -> Self {
        Self::with_state(device_id, namespace, session, LightState::new())
    }

    /// Creates a controller starting from a known state.
    #[must_use]
    pub fn with_state(
        device_id: impl Into<String>,
        namespace: impl Into<String>,
        session: SessionManager<T>,
        state: LightState,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                device_id: device_id.into(),
                namespace: namespace.into(),
                session,
                state: Mutex::new(state),
                command_lock: tokio::sync::Mutex::new(()),
                callbacks: CallbackRegistry::new(),
            }),
        }
    }

    /// Returns the device id.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    /// Returns the session this controller publishes through.
    #[must_use]
    pub fn session(&self) -> &SessionManager<T> {
        &self.inner.session
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> LightState {
        self.inner.snapshot()
    }

    /// Returns `true` if the strip is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.inner.read(LightState::is_on)
    }

    /// Returns the UI-domain brightness (0-255).
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.inner.read(LightState::brightness)
    }

    /// Returns the active effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.inner.read(LightState::effect)
    }

    /// Returns the animation speed percentage.
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.inner.read(LightState::speed)
    }

    /// Returns the special-effect sensitivity percentage.
    #[must_use]
    pub fn sensitivity(&self) -> u8 {
        self.inner.read(LightState::sensitivity)
    }

    /// Returns the primary (segment 0) color.
    #[must_use]
    pub fn primary_color(&self) -> RgbColor {
        self.inner.read(LightState::primary_color)
    }

    /// Returns all segment colors.
    #[must_use]
    pub fn segment_colors(&self) -> SegmentColors {
        self.inner.read(|state| *state.segments())
    }

    /// Turns the strip on.
    ///
    /// A color in `patch` is applied to all 25 segments. An effect selects
    /// the mode: special effects are sent as `d60`, the others as `d50`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be serialized.
    pub async fn turn_on(&self, patch: TurnOnPatch) -> crate::Result<()> {
        tracing::debug!(device_id = %self.device_id(), ?patch, "Turning on");
        self.inner
            .update(|state| {
                if let Some(brightness) = patch.brightness {
                    state.set_brightness(brightness);
                }
                if let Some(color) = patch.color {
                    state.fill_color(color);
                }
                if let Some(effect) = patch.effect {
                    state.set_effect(effect);
                }
                Ok(())
            })
            .await
    }

    /// Turns the strip off with the minimal `{"d1":0}` command.
    ///
    /// Colors, effect, speed and sensitivity survive the power cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be serialized.
    pub async fn turn_off(&self) -> crate::Result<()> {
        tracing::debug!(device_id = %self.device_id(), "Turning off");
        self.inner.power_off().await
    }

    /// Switches to `effect`, keeping colors and brightness.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be serialized.
    pub async fn set_effect(&self, effect: Effect) -> crate::Result<()> {
        self.turn_on(TurnOnPatch::new().with_effect(effect)).await
    }

    /// Sets the color of one segment and re-sends the full state.
    ///
    /// Segment 0 is the primary color.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::SegmentIndex` if `index >= 25`; nothing is sent.
    pub async fn set_segment_color(&self, index: usize, color: RgbColor) -> crate::Result<()> {
        tracing::debug!(device_id = %self.device_id(), index, color = %color, "Setting segment color");
        self.inner
            .update(|state| state.set_segment(index, color))
            .await
    }

    /// Sets the animation speed percentage and re-sends the full state.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent > 100`; nothing is sent.
    pub async fn set_speed(&self, percent: u8) -> crate::Result<()> {
        check_percent(percent)?;
        self.inner.update(|state| {
            state.set_speed(percent);
            Ok(())
        })
        .await
    }

    /// Sets the special-effect sensitivity percentage and re-sends the full
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent > 100`; nothing is sent.
    pub async fn set_sensitivity(&self, percent: u8) -> crate::Result<()> {
        check_percent(percent)?;
        self.inner.update(|state| {
            state.set_sensitivity(percent);
            Ok(())
        })
        .await
    }

    /// Applies an inbound device report.
    ///
    /// Observers are notified only when something changed. Returns `true`
    /// in that case.
    pub fn apply_report(&self, report: &DeviceReport) -> bool {
        let changed = {
            let mut state = self.inner.state.lock();
            state.apply_report(report).then(|| state.clone())
        };

        match changed {
            Some(snapshot) => {
                tracing::debug!(device_id = %self.device_id(), ?report, "State updated from report");
                self.inner.callbacks.dispatch(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Asks the device to report its full state.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be serialized.
    pub async fn request_refresh(&self) -> crate::Result<Delivery> {
        tracing::debug!(device_id = %self.device_id(), "Requesting state refresh");
        self.inner.send(&StateQuery::full()).await
    }

    /// Returns a view over segment `index`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::SegmentIndex` if `index >= 25`.
    pub fn segment(&self, index: usize) -> Result<SegmentLight<T>, ValueError> {
        if index >= SEGMENT_COUNT {
            return Err(ValueError::SegmentIndex(index));
        }
        Ok(SegmentLight::new(&self.inner, index))
    }

    /// Returns views over all 25 segments, in order.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentLight<T>> {
        (0..SEGMENT_COUNT)
            .map(|index| SegmentLight::new(&self.inner, index))
            .collect()
    }

    #[cfg(test)]
    pub(super) fn inner_for_test(&self) -> Arc<ControllerInner<T>> {
        Arc::clone(&self.inner)
    }
}

fn check_percent(percent: u8) -> Result<(), ValueError> {
    if percent > 100 {
        return Err(ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: u16::from(percent),
        });
    }
    Ok(())
}

impl<T: Transport> Subscribable for LightController<T> {
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&LightState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

impl<T: Transport> Light for LightController<T> {
    fn is_on(&self) -> bool {
        Self::is_on(self)
    }

    fn brightness(&self) -> u8 {
        Self::brightness(self)
    }

    fn effect(&self) -> Effect {
        Self::effect(self)
    }

    fn color(&self) -> RgbColor {
        self.primary_color()
    }

    async fn turn_on(&self, patch: TurnOnPatch) -> crate::Result<()> {
        Self::turn_on(self, patch).await
    }

    async fn turn_off(&self) -> crate::Result<()> {
        Self::turn_off(self).await
    }
}

impl<T: Transport> std::fmt::Debug for LightController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightController")
            .field("device_id", &self.inner.device_id)
            .field("namespace", &self.inner.namespace)
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}
