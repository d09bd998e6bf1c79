// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable broker session.
//!
//! The [`SessionManager`] owns one background task per connection attempt.
//! Subscriptions and publications issued while the session is not
//! connected are queued and replayed, in order, once the handshake
//! completes; nothing a caller issues is dropped.
//!
//! # State machine
//!
//! ```text
//! Disconnected --connect()--> Connecting --queues drained--> Connected
//!      ^                          |                              |
//!      +------ transport error ---+------------------------------+
//! ```
//!
//! Reconnection is caller-driven: the next `subscribe`, `publish` or
//! explicit [`connect`](SessionManager::connect) starts a new attempt. There
//! is no retry timer and no handshake timeout.
//!
//! # Examples
//!
//! ```no_run
//! use lepro_lib::protocol::{Delivery, SessionConfig, SessionManager};
//!
//! # async fn example() -> lepro_lib::Result<()> {
//! let config = SessionConfig::builder()
//!     .host("broker.example.com")
//!     .client_suffix("0123456789abcdef")
//!     .build()?;
//! let session = SessionManager::new(config);
//!
//! session.set_message_handler(|message| {
//!     println!("{} -> {}", message.topic, message.payload);
//!     Ok(())
//! });
//!
//! // Queued until the connection is up, then replayed.
//! assert_eq!(session.subscribe("le/12345/prp/#").await, Delivery::Queued);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::ProtocolError;

use super::transport::{InboundMessage, MqttTransport, Transport, TransportClient, TransportEvents};
use super::SessionConfig;

/// Callback receiving every inbound message.
///
/// Errors and panics are logged and never stop the inbound loop.
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) -> crate::Result<()> + Send + Sync>;

/// Connection phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection and no attempt in progress.
    Disconnected,
    /// Handshake or queue replay in progress.
    Connecting,
    /// Connected with empty queues; operations go straight to the transport.
    Connected,
}

/// Outcome of a `subscribe` or `publish` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Handed to the transport.
    Sent,
    /// Queued for replay on the next successful connection.
    Queued,
}

#[derive(Debug, Clone)]
enum PendingOp {
    Subscribe(String),
    Publish { topic: String, payload: String },
}

impl PendingOp {
    fn send<C: TransportClient>(
        self,
        client: C,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send + 'static {
        async move {
            match self {
                Self::Subscribe(topic) => client.subscribe(&topic).await,
                Self::Publish { topic, payload } => client.publish(&topic, &payload).await,
            }
        }
    }

    fn topic(&self) -> &str {
        match self {
            Self::Subscribe(topic) | Self::Publish { topic, .. } => topic,
        }
    }
}

struct SessionState<C> {
    phase: ConnectionState,
    client: Option<C>,
    /// Pending subscriptions, unique, in first-seen order.
    pending_subscriptions: VecDeque<String>,
    pending_publishes: VecDeque<(String, String)>,
    /// Operation taken for replay and not yet confirmed, with its epoch.
    in_flight: Option<(u64, PendingOp)>,
    task: Option<JoinHandle<()>>,
    /// Bumped on every connect and disconnect so a stale task cannot
    /// overwrite the state of a newer one.
    epoch: u64,
}

impl<C> SessionState<C> {
    fn enqueue(&mut self, op: PendingOp) {
        match op {
            PendingOp::Subscribe(topic) => {
                if !self.pending_subscriptions.contains(&topic) {
                    self.pending_subscriptions.push_back(topic);
                }
            }
            PendingOp::Publish { topic, payload } => {
                self.pending_publishes.push_back((topic, payload));
            }
        }
    }

    /// Puts an operation taken for replay back at the head of its queue.
    fn requeue_front(&mut self, op: PendingOp) {
        match op {
            PendingOp::Subscribe(topic) => {
                if !self.pending_subscriptions.contains(&topic) {
                    self.pending_subscriptions.push_front(topic);
                }
            }
            PendingOp::Publish { topic, payload } => {
                self.pending_publishes.push_front((topic, payload));
            }
        }
    }

    /// Takes the next operation to replay and records it as in flight.
    ///
    /// Subscriptions replay before publications.
    fn begin_replay(&mut self, epoch: u64) -> Option<PendingOp> {
        let op = match self.pending_subscriptions.pop_front() {
            Some(topic) => PendingOp::Subscribe(topic),
            None => {
                let (topic, payload) = self.pending_publishes.pop_front()?;
                PendingOp::Publish { topic, payload }
            }
        };
        self.in_flight = Some((epoch, op.clone()));
        Some(op)
    }

    fn finish_replay(&mut self, epoch: u64) {
        if self.in_flight.as_ref().is_some_and(|(e, _)| *e == epoch) {
            self.in_flight = None;
        }
    }

    /// Puts the in-flight operation of `epoch` back at the head of its queue.
    fn requeue_in_flight(&mut self, epoch: u64) {
        if self.in_flight.as_ref().is_some_and(|(e, _)| *e == epoch)
            && let Some((_, op)) = self.in_flight.take()
        {
            self.requeue_front(op);
        }
    }
}

struct SessionInner<T: Transport> {
    transport: T,
    state: Mutex<SessionState<T::Client>>,
    handler: RwLock<Option<MessageHandler>>,
}

impl<T: Transport> SessionInner<T> {
    fn dispatch(&self, message: &InboundMessage) {
        let handler = self.handler.read().clone();
        let Some(handler) = handler else {
            tracing::trace!(topic = %message.topic, "No message handler registered");
            return;
        };
        match catch_unwind(AssertUnwindSafe(|| handler(message))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(topic = %message.topic, error = %e, "Message handler failed");
            }
            Err(_) => tracing::warn!(topic = %message.topic, "Message handler panicked"),
        }
    }
}

/// Publish/subscribe session shared by every light of one account.
///
/// Cheap to clone; clones share the same connection and queues.
pub struct SessionManager<T: Transport = MqttTransport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SessionManager<MqttTransport> {
    /// Creates a session over MQTT for the given configuration.
    ///
    /// Nothing connects until the first operation or [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_transport(MqttTransport::new(config))
    }
}

impl<T: Transport> SessionManager<T> {
    /// Creates a session over any transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                state: Mutex::new(SessionState {
                    phase: ConnectionState::Disconnected,
                    client: None,
                    pending_subscriptions: VecDeque::new(),
                    pending_publishes: VecDeque::new(),
                    in_flight: None,
                    task: None,
                    epoch: 0,
                }),
                handler: RwLock::new(None),
            }),
        }
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns the current connection phase.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().phase
    }

    /// Returns `true` if the session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Returns the topics waiting to be subscribed.
    #[must_use]
    pub fn pending_subscriptions(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .pending_subscriptions
            .iter()
            .cloned()
            .collect()
    }

    /// Returns the number of publications waiting to be sent.
    #[must_use]
    pub fn pending_publish_count(&self) -> usize {
        self.inner.state.lock().pending_publishes.len()
    }

    /// Registers the inbound message handler, replacing any previous one.
    pub fn set_message_handler<F>(&self, handler: F)
    where
        F: Fn(&InboundMessage) -> crate::Result<()> + Send + Sync + 'static,
    {
        *self.inner.handler.write() = Some(Arc::new(handler));
    }

    /// Starts a connection attempt.
    ///
    /// A no-op while connecting or connected. Must be called from within a
    /// Tokio runtime.
    pub fn connect(&self) {
        let mut state = self.inner.state.lock();
        self.start_locked(&mut state);
    }

    fn start_locked(&self, state: &mut SessionState<T::Client>) {
        if state.phase != ConnectionState::Disconnected {
            return;
        }
        state.phase = ConnectionState::Connecting;
        state.epoch += 1;
        let epoch = state.epoch;
        tracing::debug!(epoch, "Starting session task");
        state.task = Some(tokio::spawn(run(Arc::clone(&self.inner), epoch)));
    }

    /// Subscribes to a topic filter, or queues it until connected.
    pub async fn subscribe(&self, topic: impl Into<String>) -> Delivery {
        self.submit(PendingOp::Subscribe(topic.into())).await
    }

    /// Publishes a payload, or queues it until connected.
    pub async fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) -> Delivery {
        self.submit(PendingOp::Publish {
            topic: topic.into(),
            payload: payload.into(),
        })
        .await
    }

    async fn submit(&self, op: PendingOp) -> Delivery {
        let connected = {
            let mut state = self.inner.state.lock();
            if state.phase == ConnectionState::Connected
                && let Some(client) = state.client.clone()
            {
                Some((client, state.epoch))
            } else {
                tracing::debug!(topic = %op.topic(), phase = ?state.phase, "Queueing operation");
                state.enqueue(op.clone());
                self.start_locked(&mut state);
                None
            }
        };
        let Some((client, epoch)) = connected else {
            return Delivery::Queued;
        };

        match op.clone().send(client).await {
            Ok(()) => {
                tracing::trace!(topic = %op.topic(), "Operation sent");
                Delivery::Sent
            }
            Err(e) => {
                tracing::warn!(topic = %op.topic(), error = %e, "Send failed, queueing for reconnect");
                let mut state = self.inner.state.lock();
                if state.epoch == epoch && state.phase == ConnectionState::Connected {
                    if let Some(task) = state.task.take() {
                        task.abort();
                    }
                    state.phase = ConnectionState::Disconnected;
                    state.client = None;
                }
                state.enqueue(op);
                self.start_locked(&mut state);
                Delivery::Queued
            }
        }
    }

    /// Cancels the connection task and waits for it to finish.
    ///
    /// Queued operations are kept and replayed if the session is started
    /// again, including one whose replay was cut short.
    pub async fn disconnect(&self) {
        let (task, epoch) = {
            let mut state = self.inner.state.lock();
            let epoch = state.epoch;
            state.epoch += 1;
            state.phase = ConnectionState::Disconnected;
            state.client = None;
            (state.task.take(), epoch)
        };
        let Some(task) = task else {
            return;
        };

        task.abort();
        match task.await {
            Ok(()) => tracing::debug!("Session task already finished"),
            Err(e) if e.is_cancelled() => tracing::debug!("Session task cancelled"),
            Err(e) => tracing::error!(error = %e, "Session task panicked"),
        }
        self.inner.state.lock().requeue_in_flight(epoch);
        tracing::info!("Session disconnected");
    }
}

impl<T: Transport> std::fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SessionManager")
            .field("state", &state.phase)
            .field("pending_subscriptions", &state.pending_subscriptions.len())
            .field("pending_publishes", &state.pending_publishes.len())
            .finish_non_exhaustive()
    }
}

async fn run<T: Transport>(inner: Arc<SessionInner<T>>, epoch: u64) {
    let result = drive(&inner, epoch).await;

    {
        let mut state = inner.state.lock();
        if state.epoch == epoch {
            state.phase = ConnectionState::Disconnected;
            state.client = None;
            state.task = None;
        }
    }

    match result {
        Ok(()) => tracing::info!("Session closed"),
        Err(e) => tracing::error!(error = %e, "Session error"),
    }
}

enum Replay {
    Done(Result<(), ProtocolError>),
    Closed,
}

/// Connects, replays both queues, then pumps inbound messages.
async fn drive<T: Transport>(inner: &SessionInner<T>, epoch: u64) -> Result<(), ProtocolError> {
    let (client, mut events) = inner.transport.connect().await?;

    loop {
        let op = {
            let mut state = inner.state.lock();
            if state.epoch != epoch {
                return Ok(());
            }
            match state.begin_replay(epoch) {
                Some(op) => op,
                None => {
                    state.phase = ConnectionState::Connected;
                    state.client = Some(client.clone());
                    break;
                }
            }
        };

        let send = op.clone().send(client.clone());
        tokio::pin!(send);
        // Inbound traffic keeps flowing while a replayed request is pending.
        let replay = loop {
            tokio::select! {
                result = &mut send => break Replay::Done(result),
                message = events.recv() => match message {
                    Ok(Some(message)) => inner.dispatch(&message),
                    Ok(None) => break Replay::Closed,
                    Err(e) => {
                        inner.state.lock().requeue_in_flight(epoch);
                        return Err(e);
                    }
                },
            }
        };

        match replay {
            Replay::Done(Ok(())) => {
                inner.state.lock().finish_replay(epoch);
                tracing::debug!(topic = %op.topic(), "Replayed queued operation");
            }
            Replay::Done(Err(e)) => {
                inner.state.lock().requeue_in_flight(epoch);
                return Err(e);
            }
            Replay::Closed => {
                inner.state.lock().requeue_in_flight(epoch);
                return Ok(());
            }
        }
    }

    tracing::info!("Session connected");
    while let Some(message) = events.recv().await? {
        inner.dispatch(&message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::testing::{FakeOp, FakeTransport, eventually};

    fn session() -> (SessionManager<FakeTransport>, FakeTransport) {
        let transport = FakeTransport::new();
        (SessionManager::with_transport(transport.clone()), transport)
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let (session, transport) = session();
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test]
    async fn queued_publishes_replay_in_order() {
        let (session, transport) = session();

        assert_eq!(session.publish("t/1", "a").await, Delivery::Queued);
        assert_eq!(session.publish("t/2", "b").await, Delivery::Queued);
        assert_eq!(session.subscribe("s/#").await, Delivery::Queued);
        assert_eq!(session.connection_state(), ConnectionState::Connecting);
        assert_eq!(session.pending_publish_count(), 2);

        transport.open_gate();
        eventually(|| session.is_connected()).await;

        assert_eq!(
            transport.ops(),
            vec![
                FakeOp::Subscribe("s/#".into()),
                FakeOp::Publish("t/1".into(), "a".into()),
                FakeOp::Publish("t/2".into(), "b".into()),
            ]
        );
        assert_eq!(session.pending_publish_count(), 0);
        assert!(session.pending_subscriptions().is_empty());
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn connected_session_sends_directly() {
        let (session, transport) = session();
        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        assert_eq!(session.publish("t", "p").await, Delivery::Sent);
        assert_eq!(session.subscribe("s").await, Delivery::Sent);
        assert_eq!(
            transport.ops(),
            vec![
                FakeOp::Publish("t".into(), "p".into()),
                FakeOp::Subscribe("s".into()),
            ]
        );
    }

    #[tokio::test]
    async fn connect_is_idempotent_while_connecting() {
        let (session, transport) = session();
        session.connect();
        session.connect();
        session.publish("t", "p").await;
        transport.open_gate();
        eventually(|| session.is_connected()).await;
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn pending_subscriptions_are_deduplicated() {
        let (session, _transport) = session();
        session.subscribe("a").await;
        session.subscribe("b").await;
        session.subscribe("a").await;
        assert_eq!(session.pending_subscriptions(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failed_connect_keeps_queues() {
        let (session, transport) = session();
        transport.fail_next_connects(1);
        transport.open_gate();

        session.publish("t", "kept").await;
        eventually(|| session.connection_state() == ConnectionState::Disconnected).await;
        assert_eq!(session.pending_publish_count(), 1);
        assert!(transport.ops().is_empty());

        // Caller-driven retry.
        session.connect();
        eventually(|| session.is_connected()).await;
        assert_eq!(
            transport.ops(),
            vec![FakeOp::Publish("t".into(), "kept".into())]
        );
    }

    #[tokio::test]
    async fn failed_replay_requeues_at_front() {
        let (session, transport) = session();
        transport.fail_next_publishes(1);
        transport.open_gate();

        session.publish("t/1", "a").await;
        session.publish("t/2", "b").await;
        eventually(|| session.connection_state() == ConnectionState::Disconnected).await;
        assert_eq!(session.pending_publish_count(), 2);

        session.connect();
        eventually(|| session.is_connected()).await;
        assert_eq!(
            transport.ops(),
            vec![
                FakeOp::Publish("t/1".into(), "a".into()),
                FakeOp::Publish("t/2".into(), "b".into()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_direct_send_is_queued_and_reconnects() {
        let (session, transport) = session();
        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        transport.fail_next_publishes(1);
        assert_eq!(session.publish("t", "retry").await, Delivery::Queued);

        eventually(|| session.is_connected()).await;
        assert_eq!(transport.connect_count(), 2);
        assert_eq!(
            transport.ops(),
            vec![FakeOp::Publish("t".into(), "retry".into())]
        );
    }

    #[tokio::test]
    async fn inbound_messages_reach_handler() {
        let (session, transport) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.set_message_handler(move |message| {
            sink.lock().push(message.payload.clone());
            Ok(())
        });

        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        transport.inject("le/1/prp/rpt", "one");
        transport.inject("le/1/prp/rpt", "two");
        eventually(|| seen.lock().len() == 2).await;
        assert_eq!(*seen.lock(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn handler_errors_do_not_stop_the_loop() {
        let (session, transport) = session();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        session.set_message_handler(move |message| {
            *sink.lock() += 1;
            if message.payload == "bad" {
                return Err(Error::DeviceNotFound("x".into()));
            }
            Ok(())
        });

        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        transport.inject("t", "bad");
        transport.inject("t", "good");
        eventually(|| *seen.lock() == 2).await;
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn handler_panics_do_not_stop_the_loop() {
        let (session, transport) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.set_message_handler(move |message| {
            assert_ne!(message.payload, "boom", "handler rejected payload");
            sink.lock().push(message.payload.clone());
            Ok(())
        });

        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        transport.inject("t", "boom");
        transport.inject("t", "after");
        eventually(|| seen.lock().len() == 1).await;
        assert_eq!(*seen.lock(), vec!["after"]);
        assert!(session.is_connected());
        assert_eq!(session.publish("t", "p").await, Delivery::Sent);
    }

    #[tokio::test]
    async fn broker_close_returns_to_disconnected() {
        let (session, transport) = session();
        transport.open_gate();
        session.connect();
        eventually(|| session.is_connected()).await;

        transport.close();
        eventually(|| session.connection_state() == ConnectionState::Disconnected).await;

        assert_eq!(session.publish("t", "later").await, Delivery::Queued);
        eventually(|| session.is_connected()).await;
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test]
    async fn disconnect_cancels_stalled_handshake() {
        let (session, transport) = session();
        session.publish("t", "p").await;
        assert_eq!(session.connection_state(), ConnectionState::Connecting);

        session.disconnect().await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.pending_publish_count(), 1);
        assert!(transport.ops().is_empty());
    }

    #[tokio::test]
    async fn disconnect_keeps_operation_stalled_in_replay() {
        let (session, transport) = session();
        transport.stall_publishes(true);
        transport.open_gate();

        session.publish("t/1", "a").await;
        session.publish("t/2", "b").await;
        eventually(|| session.pending_publish_count() == 1).await;

        session.disconnect().await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.pending_publish_count(), 2);

        transport.stall_publishes(false);
        session.connect();
        eventually(|| session.is_connected()).await;
        assert_eq!(
            transport.published(),
            vec![
                ("t/1".to_string(), "a".to_string()),
                ("t/2".to_string(), "b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn disconnect_without_task_is_noop() {
        let (session, _transport) = session();
        session.disconnect().await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }
}
