//! Event Broker Service
//!
//! Maintains the registry of live push connections and their per-match
//! subscriptions, and fans published match events out to every current
//! subscriber.
//!
//! Delivery contract:
//! - Best-effort, fire-and-forget: a failed write to one subscriber never
//!   aborts delivery to others and is never retried.
//! - Non-blocking: every connection has a bounded outbound queue and writes
//!   use `try_send`, so a slow or dead subscriber cannot stall fan-out.
//! - Ordered per match: fan-out for one publish completes before the caller
//!   returns, so per-match publish order is preserved for each subscriber.
//! - No replay: events published while a client is offline are lost.
//!
//! ```text
//! Engine / Reaper
//!       │ publish(match_id, kind, payload)
//!   ┌───▼────┐
//!   │ Broker │──snapshot subscribers──┐
//!   └───┬────┘                        │
//!       │ try_send(Frame)             │
//!  ┌────▼─────┐  ┌──────────┐  ┌──────▼───┐
//!  │ client A │  │ client B │  │ client C │   (bounded mpsc queues,
//!  └──────────┘  └──────────┘  └──────────┘    drained by the transport)
//! ```

pub mod broker;
pub mod envelope;
pub mod registry;

pub use broker::{BrokerConfig, EventBroker};
pub use envelope::{Envelope, EventKind, Frame};
pub use registry::DropPolicy;
