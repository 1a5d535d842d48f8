//! # Hexmap Bus - Map Cache Domain Events
//!
//! Fire-and-forget pub/sub between the map cache and the rest of the
//! application (chat, toolbox, telemetry). The cache publishes exactly one
//! [`MapEvent`] per successful structural edit and nothing on failure;
//! consumers subscribe with an [`EventFilter`] and receive
//! [`EventEnvelope`]s.
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │  Map Cache   │      publish()       │  Subscriber  │
//! │ (coordinator)│ ──────┐              │ (chat, ...)  │
//! └──────────────┘       │              └──────────────┘
//!                        ▼                     ↑
//!                  ┌──────────────┐            │
//!                  │  Event Bus   │ ───────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! The bus is an optional collaborator: components constructed without one
//! get the [`NoopEventBus`], so call sites never branch on an `Option`.

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventEnvelope, EventFilter, EventKind, MapEvent, EVENT_SOURCE};
pub use publisher::{EventPublisher, InMemoryEventBus, NoopEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before older ones are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
