//! The broker service: registration, subscription, publish fan-out, and
//! the periodic keep-alive.
//!
//! An explicit service instance with a start/stop lifecycle. Handlers and
//! tests receive it by `Arc`, so fan-out is unit-testable with nothing but
//! channel receivers standing in for real transports.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::ids::{ClientId, MatchId};

use crate::envelope::{Envelope, EventKind, Frame};
use crate::registry::{DropPolicy, Registry, WriteOutcome};

/// Broker tuning knobs
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Interval between keep-alive frames on every live connection
    pub keepalive_interval: Duration,
    /// Bounded outbound queue capacity per connection
    pub queue_capacity: usize,
    /// Policy when a connection's queue overflows
    pub drop_policy: DropPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            queue_capacity: 64,
            drop_policy: DropPolicy::DropNewest,
        }
    }
}

/// Real-time event fan-out service
pub struct EventBroker {
    registry: Registry,
    config: BrokerConfig,
    shutdown: watch::Sender<bool>,
}

impl EventBroker {
    pub fn new(config: BrokerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { registry: Registry::new(), config, shutdown }
    }

    /// Add a live connection.
    ///
    /// Assigns a client id, stores the transport handle, and immediately
    /// queues the `connected` envelope carrying the assigned id. The
    /// returned receiver is the connection's outbound queue; the transport
    /// drains it until disconnect.
    pub fn register(&self) -> (ClientId, mpsc::Receiver<Frame>) {
        let client_id = ClientId::new();
        let rx = self.registry.add_connection(client_id, self.config.queue_capacity);
        info!(%client_id, "event stream client connected");

        if let Some(handle) = self.registry.connection(&client_id) {
            handle.write(Frame::Event(Envelope::connected(client_id)), self.config.drop_policy);
        }
        (client_id, rx)
    }

    /// Subscribe a connection to a match's events. Idempotent.
    ///
    /// Returns false if the client is not currently registered. On success
    /// the `subscribed` acknowledgment is queued on that connection.
    pub fn subscribe(&self, client_id: ClientId, match_id: MatchId) -> bool {
        if !self.registry.subscribe(client_id, match_id) {
            warn!(%client_id, %match_id, "subscribe for unregistered client");
            return false;
        }
        debug!(%client_id, %match_id, "client subscribed");

        if let Some(handle) = self.registry.connection(&client_id) {
            handle.write(Frame::Event(Envelope::subscribed(match_id)), self.config.drop_policy);
        }
        true
    }

    /// Remove one subscription without touching the connection itself.
    ///
    /// Returns false if the client is not currently registered. The stream
    /// stays open; only events for this match stop arriving.
    pub fn unsubscribe(&self, client_id: ClientId, match_id: MatchId) -> bool {
        if self.registry.connection(&client_id).is_none() {
            warn!(%client_id, %match_id, "unsubscribe for unregistered client");
            return false;
        }
        self.registry.unsubscribe(&client_id, &match_id);
        debug!(%client_id, %match_id, "client unsubscribed");
        true
    }

    /// Deliver an event to every current subscriber of a match.
    ///
    /// Best-effort: the subscriber set is snapshotted first, writes are
    /// non-blocking, and per-subscriber failures are logged, never
    /// propagated. Returns the number of subscribers written to.
    pub fn publish(&self, match_id: MatchId, event: EventKind, payload: Map<String, Value>) -> usize {
        let subscribers = self.registry.subscribers_of(&match_id);
        if subscribers.is_empty() {
            debug!(%match_id, ?event, "publish with no subscribers");
            return 0;
        }

        let envelope = Envelope::for_match(match_id, event, payload);
        let mut delivered = 0;
        for (client_id, handle) in subscribers {
            match handle.write(Frame::Event(envelope.clone()), self.config.drop_policy) {
                WriteOutcome::Sent => delivered += 1,
                WriteOutcome::Dropped => {
                    warn!(%client_id, %match_id, dropped = handle.dropped_frames(), "subscriber queue full, event dropped");
                }
                WriteOutcome::Dead => {
                    warn!(%client_id, %match_id, "dropping dead subscriber connection");
                    self.registry.remove_connection(&client_id);
                }
            }
        }
        debug!(%match_id, ?event, delivered, "event fanned out");
        delivered
    }

    /// Remove a connection and purge it from every subscriber set.
    ///
    /// Must be called when the transport closes; after it returns the
    /// client can receive nothing further.
    pub fn unregister(&self, client_id: &ClientId) {
        if self.registry.remove_connection(client_id) {
            info!(%client_id, "event stream client disconnected");
        }
    }

    /// Start the periodic keep-alive task.
    ///
    /// Every tick queues a payload-less keep-alive frame on each live
    /// connection so intermediaries do not tear idle streams down.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let broker = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(broker.config.keepalive_interval);
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => broker.send_keepalives(),
                    _ = shutdown.changed() => {
                        info!("event broker keep-alive stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Signal the keep-alive task to stop after its in-flight tick
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    fn send_keepalives(&self) {
        for (client_id, handle) in self.registry.all_connections() {
            if handle.write(Frame::KeepAlive, self.config.drop_policy) == WriteOutcome::Dead {
                debug!(%client_id, "keep-alive found dead connection");
                self.registry.remove_connection(&client_id);
            }
        }
    }

    /// Number of live connections (test and metrics hook)
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> Arc<EventBroker> {
        Arc::new(EventBroker::new(BrokerConfig::default()))
    }

    fn next_event(rx: &mut mpsc::Receiver<Frame>) -> Option<Envelope> {
        loop {
            match rx.try_recv() {
                Ok(Frame::Event(env)) => return Some(env),
                Ok(Frame::KeepAlive) => continue,
                Err(_) => return None,
            }
        }
    }

    #[tokio::test]
    async fn test_register_sends_connected_envelope() {
        let broker = broker();
        let (client_id, mut rx) = broker.register();

        let env = next_event(&mut rx).unwrap();
        assert_eq!(env.event, EventKind::Connected);
        assert_eq!(env.client_id, Some(client_id));
        assert!(env.match_id.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_acks_and_rejects_unregistered() {
        let broker = broker();
        let match_id = MatchId::new();

        assert!(!broker.subscribe(ClientId::new(), match_id));

        let (client_id, mut rx) = broker.register();
        assert!(broker.subscribe(client_id, match_id));
        assert!(broker.subscribe(client_id, match_id)); // idempotent

        next_event(&mut rx).unwrap(); // connected
        let ack = next_event(&mut rx).unwrap();
        assert_eq!(ack.event, EventKind::Subscribed);
        assert_eq!(ack.match_id, Some(match_id));
    }

    #[tokio::test]
    async fn test_publish_reaches_only_subscribers() {
        let broker = broker();
        let match_a = MatchId::new();
        let match_b = MatchId::new();

        let (subscriber, mut sub_rx) = broker.register();
        let (_bystander, mut other_rx) = broker.register();
        broker.subscribe(subscriber, match_a);

        // No subscribers yet for match_b
        assert_eq!(broker.publish(match_b, EventKind::Closed, Map::new()), 0);

        assert_eq!(broker.publish(match_a, EventKind::Hit, Map::new()), 1);

        next_event(&mut sub_rx).unwrap(); // connected
        next_event(&mut sub_rx).unwrap(); // subscribed
        let delivered = next_event(&mut sub_rx).unwrap();
        assert_eq!(delivered.event, EventKind::Hit);
        assert_eq!(delivered.match_id, Some(match_a));
        assert!(next_event(&mut sub_rx).is_none(), "exactly one delivery");

        next_event(&mut other_rx).unwrap(); // connected
        assert!(next_event(&mut other_rx).is_none(), "unsubscribed client sees nothing");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_but_keeps_connection() {
        let broker = broker();
        let match_id = MatchId::new();

        assert!(!broker.unsubscribe(ClientId::new(), match_id));

        let (client_id, mut rx) = broker.register();
        broker.subscribe(client_id, match_id);
        assert_eq!(broker.publish(match_id, EventKind::Hit, Map::new()), 1);

        assert!(broker.unsubscribe(client_id, match_id));
        assert_eq!(broker.publish(match_id, EventKind::Miss, Map::new()), 0);
        assert_eq!(broker.connection_count(), 1);

        next_event(&mut rx).unwrap(); // connected
        next_event(&mut rx).unwrap(); // subscribed
        let delivered = next_event(&mut rx).unwrap();
        assert_eq!(delivered.event, EventKind::Hit);
        assert!(next_event(&mut rx).is_none(), "nothing after unsubscribe");
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let broker = broker();
        let match_id = MatchId::new();
        let (client_id, mut rx) = broker.register();
        broker.subscribe(client_id, match_id);

        broker.unregister(&client_id);
        assert_eq!(broker.publish(match_id, EventKind::Miss, Map::new()), 0);
        assert_eq!(broker.connection_count(), 0);

        next_event(&mut rx).unwrap(); // connected
        next_event(&mut rx).unwrap(); // subscribed
        assert!(next_event(&mut rx).is_none());
    }

    #[tokio::test]
    async fn test_publish_drops_dead_subscriber_without_failing_others() {
        let broker = broker();
        let match_id = MatchId::new();

        let (dead, dead_rx) = broker.register();
        let (live, mut live_rx) = broker.register();
        broker.subscribe(dead, match_id);
        broker.subscribe(live, match_id);
        drop(dead_rx);

        assert_eq!(broker.publish(match_id, EventKind::PlayerJoined, Map::new()), 1);
        // Dead connection was purged
        assert_eq!(broker.connection_count(), 1);

        next_event(&mut live_rx).unwrap(); // connected
        next_event(&mut live_rx).unwrap(); // subscribed
        let env = next_event(&mut live_rx).unwrap();
        assert_eq!(env.event, EventKind::PlayerJoined);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_frames_flow_until_stop() {
        let broker = Arc::new(EventBroker::new(BrokerConfig {
            keepalive_interval: Duration::from_secs(30),
            ..BrokerConfig::default()
        }));
        let (_client_id, mut rx) = broker.register();
        let task = broker.start();

        // Paused clock auto-advances to the broker's 30s timer while we sleep
        tokio::time::sleep(Duration::from_secs(31)).await;

        // Skip the connected envelope, then expect a keep-alive
        assert!(matches!(rx.try_recv(), Ok(Frame::Event(_))));
        assert!(matches!(rx.try_recv(), Ok(Frame::KeepAlive)));

        broker.stop();
        task.await.unwrap();
    }
}
