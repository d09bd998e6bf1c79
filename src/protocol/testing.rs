// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::error::ProtocolError;

use super::transport::{InboundMessage, Transport, TransportClient, TransportEvents};

/// An operation that reached the fake broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeOp {
    Subscribe(String),
    Publish(String, String),
}

struct FakeInner {
    gate: watch::Sender<bool>,
    stall: watch::Sender<bool>,
    connects: AtomicUsize,
    failing_connects: AtomicUsize,
    failing_publishes: AtomicUsize,
    ops: Mutex<Vec<FakeOp>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<InboundMessage>>>,
}

/// Transport whose handshake waits until [`open_gate`](Self::open_gate) and
/// which records every successful operation.
#[derive(Clone)]
pub(crate) struct FakeTransport {
    inner: Arc<FakeInner>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(FakeInner {
                gate: watch::Sender::new(false),
                stall: watch::Sender::new(false),
                connects: AtomicUsize::new(0),
                failing_connects: AtomicUsize::new(0),
                failing_publishes: AtomicUsize::new(0),
                ops: Mutex::new(Vec::new()),
                inbound: Mutex::new(None),
            }),
        }
    }

    /// Lets every pending and future handshake complete.
    pub(crate) fn open_gate(&self) {
        self.inner.gate.send_replace(true);
    }

    /// While set, publications wait instead of completing.
    pub(crate) fn stall_publishes(&self, stalled: bool) {
        self.inner.stall.send_replace(stalled);
    }

    pub(crate) fn fail_next_connects(&self, count: usize) {
        self.inner.failing_connects.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_publishes(&self, count: usize) {
        self.inner.failing_publishes.store(count, Ordering::SeqCst);
    }

    /// Number of handshakes started.
    pub(crate) fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn ops(&self) -> Vec<FakeOp> {
        self.inner.ops.lock().clone()
    }

    pub(crate) fn published(&self) -> Vec<(String, String)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FakeOp::Publish(topic, payload) => Some((topic, payload)),
                FakeOp::Subscribe(_) => None,
            })
            .collect()
    }

    pub(crate) fn subscribed(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                FakeOp::Subscribe(topic) => Some(topic),
                FakeOp::Publish(..) => None,
            })
            .collect()
    }

    pub(crate) fn clear_ops(&self) {
        self.inner.ops.lock().clear();
    }

    /// Delivers a message on the current connection.
    pub(crate) fn inject(&self, topic: &str, payload: &str) {
        if let Some(tx) = self.inner.inbound.lock().as_ref() {
            let _ = tx.send(InboundMessage::new(topic, payload));
        }
    }

    /// Closes the current connection cleanly.
    pub(crate) fn close(&self) {
        self.inner.inbound.lock().take();
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Transport for FakeTransport {
    type Client = FakeClient;
    type Events = FakeEvents;

    async fn connect(&self) -> Result<(FakeClient, FakeEvents), ProtocolError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.inner.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| ProtocolError::ConnectionFailed(e.to_string()))?;

        if Self::take_failure(&self.inner.failing_connects) {
            return Err(ProtocolError::ConnectionFailed("refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.inbound.lock() = Some(tx);
        Ok((
            FakeClient {
                inner: Arc::clone(&self.inner),
            },
            FakeEvents { rx },
        ))
    }
}

#[derive(Clone)]
pub(crate) struct FakeClient {
    inner: Arc<FakeInner>,
}

impl TransportClient for FakeClient {
    async fn subscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        self.inner.ops.lock().push(FakeOp::Subscribe(topic.to_string()));
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        if FakeTransport::take_failure(&self.inner.failing_publishes) {
            return Err(ProtocolError::ConnectionFailed("publish failed".to_string()));
        }
        let mut stall = self.inner.stall.subscribe();
        stall
            .wait_for(|stalled| !*stalled)
            .await
            .map_err(|e| ProtocolError::ConnectionFailed(e.to_string()))?;
        self.inner
            .ops
            .lock()
            .push(FakeOp::Publish(topic.to_string(), payload.to_string()));
        Ok(())
    }
}

pub(crate) struct FakeEvents {
    rx: mpsc::UnboundedReceiver<InboundMessage>,
}

impl TransportEvents for FakeEvents {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, ProtocolError> {
        Ok(self.rx.recv().await)
    }
}

/// Yields to the scheduler until `condition` holds.
///
/// # Panics
///
/// Panics if the condition is still false after many scheduler rounds.
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
