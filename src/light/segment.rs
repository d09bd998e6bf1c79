// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-segment view over a light controller.

use std::sync::{Arc, Weak};

use crate::error::Error;
use crate::protocol::{MqttTransport, Transport};
use crate::state::LightState;
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{Effect, RgbColor};

use super::controller::ControllerInner;
use super::{Light, TurnOnPatch};

struct SegmentInner<T: Transport> {
    parent: Weak<ControllerInner<T>>,
    index: usize,
    callbacks: CallbackRegistry,
    /// Forwarding callback registered on the parent.
    parent_subscription: SubscriptionId,
}

impl<T: Transport> Drop for SegmentInner<T> {
    fn drop(&mut self) {
        if let Some(parent) = self.parent.upgrade() {
            parent.callbacks.unsubscribe(self.parent_subscription);
        }
    }
}

/// One segment of a strip.
///
/// Reads `is_on`, brightness and effect from the parent controller and its
/// own color from the parent's segment colors. Writes go through the parent,
/// which re-sends the full strip state.
///
/// The view does not keep its controller alive. Once the controller is
/// dropped, getters return the default state and commands fail with
/// [`Error::ControllerDropped`].
///
/// Observers registered on a segment receive the parent's snapshots.
pub struct SegmentLight<T: Transport = MqttTransport> {
    inner: Arc<SegmentInner<T>>,
}

impl<T: Transport> Clone for SegmentLight<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SegmentLight<T> {
    pub(super) fn new(parent: &Arc<ControllerInner<T>>, index: usize) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<SegmentInner<T>>| {
            let weak = weak.clone();
            let parent_subscription = parent.callbacks.on_state_changed(move |state| {
                if let Some(segment) = weak.upgrade() {
                    segment.callbacks.dispatch(state);
                }
            });
            SegmentInner {
                parent: Arc::downgrade(parent),
                index,
                callbacks: CallbackRegistry::new(),
                parent_subscription,
            }
        });
        Self { inner }
    }

    /// Returns the segment index (0-24).
    #[must_use]
    pub fn index(&self) -> usize {
        self.inner.index
    }

    fn parent(&self) -> Result<Arc<ControllerInner<T>>, Error> {
        self.inner.parent.upgrade().ok_or(Error::ControllerDropped)
    }

    fn read<R>(&self, f: impl FnOnce(&LightState) -> R) -> R {
        match self.inner.parent.upgrade() {
            Some(parent) => parent.read(f),
            None => f(&LightState::default()),
        }
    }

    /// Returns `true` if the strip is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.read(LightState::is_on)
    }

    /// Returns the strip brightness (0-255).
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.read(LightState::brightness)
    }

    /// Returns the strip effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.read(LightState::effect)
    }

    /// Returns this segment's color.
    #[must_use]
    pub fn color(&self) -> RgbColor {
        let index = self.inner.index;
        self.read(|state| state.segments()[index])
    }

    /// Sets this segment's color.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerDropped`] if the controller is gone.
    pub async fn set_color(&self, color: RgbColor) -> crate::Result<()> {
        let index = self.inner.index;
        self.parent()?
            .update(|state| state.set_segment(index, color))
            .await
    }

    /// Turns the strip on, applying the patch's brightness and its color to
    /// this segment only. A patch effect is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerDropped`] if the controller is gone.
    pub async fn turn_on(&self, patch: TurnOnPatch) -> crate::Result<()> {
        let index = self.inner.index;
        if let Some(effect) = patch.effect {
            tracing::debug!(index, effect = %effect, "Ignoring effect on segment");
        }
        self.parent()?
            .update(|state| {
                if let Some(brightness) = patch.brightness {
                    state.set_brightness(brightness);
                }
                match patch.color {
                    Some(color) => state.set_segment(index, color),
                    None => Ok(()),
                }
            })
            .await
    }

    /// Turns the whole strip off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControllerDropped`] if the controller is gone.
    pub async fn turn_off(&self) -> crate::Result<()> {
        self.parent()?.power_off().await
    }
}

impl<T: Transport> Subscribable for SegmentLight<T> {
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

impl<T: Transport> Light for SegmentLight<T> {
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
        Self::color(self)
    }

    async fn turn_on(&self, patch: TurnOnPatch) -> crate::Result<()> {
        Self::turn_on(self, patch).await
    }

    async fn turn_off(&self) -> crate::Result<()> {
        Self::turn_off(self).await
    }
}

impl<T: Transport> std::fmt::Debug for SegmentLight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentLight")
            .field("index", &self.inner.index)
            .field("attached", &(self.inner.parent.strong_count() > 0))
            .finish()
    }
}
