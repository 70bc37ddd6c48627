//! Connection and subscription registry
//!
//! Two maps behind a single lock: connection id → live transport handle,
//! and match id → subscriber set. A connection id appears in a subscriber
//! set only while its handle is live; disconnect removes both entries under
//! one lock acquisition, so no stale entries or dangling handles survive.
//!
//! Fan-out callers snapshot the subscriber handles under the lock and write
//! outside it, so a slow transport write never blocks registry mutation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::warn;
use types::ids::{ClientId, MatchId};

use crate::envelope::Frame;

/// Policy when a connection's bounded outbound queue overflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Drop the frame being sent, count it, and keep the connection
    DropNewest,
    /// Give up on the lagging connection entirely
    Disconnect,
}

/// Live transport handle for one connection: the sending half of its
/// bounded outbound queue, plus a dropped-frame counter.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<Frame>,
    dropped: Arc<AtomicU64>,
}

/// Outcome of a non-blocking write to one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Sent,
    /// Queue full, frame dropped under `DropPolicy::DropNewest`
    Dropped,
    /// Queue full under `DropPolicy::Disconnect`, or receiver gone
    Dead,
}

impl ConnectionHandle {
    fn new(tx: mpsc::Sender<Frame>) -> Self {
        Self { tx, dropped: Arc::new(AtomicU64::new(0)) }
    }

    /// Non-blocking write. Never waits on the subscriber.
    pub fn write(&self, frame: Frame, policy: DropPolicy) -> WriteOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => WriteOutcome::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => match policy {
                DropPolicy::DropNewest => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    WriteOutcome::Dropped
                }
                DropPolicy::Disconnect => WriteOutcome::Dead,
            },
            Err(mpsc::error::TrySendError::Closed(_)) => WriteOutcome::Dead,
        }
    }

    /// Frames dropped on this connection due to overflow
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Inner {
    connections: HashMap<ClientId, ConnectionHandle>,
    subscriptions: HashMap<MatchId, HashSet<ClientId>>,
}

/// Shared registry of live connections and per-match subscriber sets
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live connection, creating its bounded outbound queue.
    /// Returns the receiving half for the transport to drain.
    pub fn add_connection(&self, client_id: ClientId, queue_capacity: usize) -> mpsc::Receiver<Frame> {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let mut inner = self.lock();
        inner.connections.insert(client_id, ConnectionHandle::new(tx));
        rx
    }

    /// Remove a connection and purge it from every subscriber set.
    /// Returns true if the connection was present.
    pub fn remove_connection(&self, client_id: &ClientId) -> bool {
        let mut inner = self.lock();
        let present = inner.connections.remove(client_id).is_some();
        inner.subscriptions.retain(|_, subscribers| {
            subscribers.remove(client_id);
            !subscribers.is_empty()
        });
        present
    }

    /// Add a client to a match's subscriber set. Idempotent.
    /// Returns false if the client has no live connection.
    pub fn subscribe(&self, client_id: ClientId, match_id: MatchId) -> bool {
        let mut inner = self.lock();
        if !inner.connections.contains_key(&client_id) {
            return false;
        }
        inner.subscriptions.entry(match_id).or_default().insert(client_id);
        true
    }

    /// Remove a client from one match's subscriber set, pruning the set
    /// if it becomes empty.
    pub fn unsubscribe(&self, client_id: &ClientId, match_id: &MatchId) {
        let mut inner = self.lock();
        if let Some(subscribers) = inner.subscriptions.get_mut(match_id) {
            subscribers.remove(client_id);
            if subscribers.is_empty() {
                inner.subscriptions.remove(match_id);
            }
        }
    }

    /// Snapshot the handle for one connection
    pub fn connection(&self, client_id: &ClientId) -> Option<ConnectionHandle> {
        self.lock().connections.get(client_id).cloned()
    }

    /// Snapshot the live handles of every subscriber of a match
    pub fn subscribers_of(&self, match_id: &MatchId) -> Vec<(ClientId, ConnectionHandle)> {
        let inner = self.lock();
        inner
            .subscriptions
            .get(match_id)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .filter_map(|id| inner.connections.get(id).map(|h| (*id, h.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot every live connection handle
    pub fn all_connections(&self) -> Vec<(ClientId, ConnectionHandle)> {
        self.lock()
            .connections
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Number of subscribers currently registered for a match
    pub fn subscriber_count(&self, match_id: &MatchId) -> usize {
        self.lock()
            .subscriptions
            .get(match_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_requires_connection() {
        let registry = Registry::new();
        let client = ClientId::new();
        let match_id = MatchId::new();

        assert!(!registry.subscribe(client, match_id));

        let _rx = registry.add_connection(client, 8);
        assert!(registry.subscribe(client, match_id));
        // Idempotent
        assert!(registry.subscribe(client, match_id));
        assert_eq!(registry.subscriber_count(&match_id), 1);
    }

    #[test]
    fn test_remove_connection_purges_subscriptions() {
        let registry = Registry::new();
        let client = ClientId::new();
        let m1 = MatchId::new();
        let m2 = MatchId::new();

        let _rx = registry.add_connection(client, 8);
        registry.subscribe(client, m1);
        registry.subscribe(client, m2);

        assert!(registry.remove_connection(&client));
        assert_eq!(registry.subscriber_count(&m1), 0);
        assert_eq!(registry.subscriber_count(&m2), 0);
        assert_eq!(registry.connection_count(), 0);
        // Second removal is a no-op
        assert!(!registry.remove_connection(&client));
    }

    #[test]
    fn test_unsubscribe_prunes_empty_sets() {
        let registry = Registry::new();
        let client = ClientId::new();
        let match_id = MatchId::new();

        let _rx = registry.add_connection(client, 8);
        registry.subscribe(client, match_id);
        registry.unsubscribe(&client, &match_id);

        assert_eq!(registry.subscriber_count(&match_id), 0);
        assert!(registry.lock().subscriptions.is_empty());
    }

    #[tokio::test]
    async fn test_write_overflow_drop_newest() {
        let registry = Registry::new();
        let client = ClientId::new();
        let mut rx = registry.add_connection(client, 2);
        let handle = registry.connection(&client).unwrap();

        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::DropNewest), WriteOutcome::Sent);
        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::DropNewest), WriteOutcome::Sent);
        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::DropNewest), WriteOutcome::Dropped);
        assert_eq!(handle.dropped_frames(), 1);

        // Draining frees capacity again
        rx.recv().await.unwrap();
        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::DropNewest), WriteOutcome::Sent);
    }

    #[tokio::test]
    async fn test_write_overflow_disconnect_policy() {
        let registry = Registry::new();
        let client = ClientId::new();
        let _rx = registry.add_connection(client, 1);
        let handle = registry.connection(&client).unwrap();

        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::Disconnect), WriteOutcome::Sent);
        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::Disconnect), WriteOutcome::Dead);
    }

    #[test]
    fn test_write_to_closed_receiver_is_dead() {
        let registry = Registry::new();
        let client = ClientId::new();
        let rx = registry.add_connection(client, 4);
        drop(rx);

        let handle = registry.connection(&client).unwrap();
        assert_eq!(handle.write(Frame::KeepAlive, DropPolicy::DropNewest), WriteOutcome::Dead);
    }
}
