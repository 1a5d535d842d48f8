//! Domain events published by the map cache.
//!
//! Event names and payload fields are part of the application-wide contract;
//! renaming a field here breaks every subscriber.

use hexmap_coords::CoordId;
use serde::{Deserialize, Serialize};

/// Source tag carried by every envelope the map cache publishes.
pub const EVENT_SOURCE: &str = "map_cache";

/// One successful structural edit, as seen by the rest of the application.
///
/// Exactly one of these is published per completed edit. Failed or rolled
/// back edits publish nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MapEvent {
    /// A tile was created and confirmed by the remote authority.
    TileCreated { tile_id: String, tile_name: String },

    /// A tile's fields were updated.
    TileUpdated { tile_id: String, tile_name: String },

    /// A tile (and its subtree) was deleted.
    TileDeleted { tile_id: String, tile_name: String },

    /// A tile's subtree was moved into empty space.
    TileMoved {
        tile_id: String,
        tile_name: String,
        from_coord_id: CoordId,
        to_coord_id: CoordId,
    },

    /// Two tiles (and their subtrees) exchanged positions.
    TilesSwapped {
        tile1_id: String,
        tile1_name: String,
        tile2_id: String,
        tile2_name: String,
    },
}

impl MapEvent {
    /// The kind discriminant, used for filtering.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::TileCreated { .. } => EventKind::TileCreated,
            MapEvent::TileUpdated { .. } => EventKind::TileUpdated,
            MapEvent::TileDeleted { .. } => EventKind::TileDeleted,
            MapEvent::TileMoved { .. } => EventKind::TileMoved,
            MapEvent::TilesSwapped { .. } => EventKind::TilesSwapped,
        }
    }
}

/// Discriminant-only view of [`MapEvent`], for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    TileCreated,
    TileUpdated,
    TileDeleted,
    TileMoved,
    TilesSwapped,
}

/// The envelope every published event travels in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Always [`EVENT_SOURCE`] for events from the map cache.
    pub source: String,
    /// Milliseconds since the Unix epoch, from the publisher's time source.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    /// The event itself.
    #[serde(flatten)]
    pub event: MapEvent,
}

impl EventEnvelope {
    /// Wrap an event in a map-cache envelope.
    #[must_use]
    pub fn new(event: MapEvent, timestamp_ms: u64) -> Self {
        Self {
            source: EVENT_SOURCE.to_string(),
            timestamp_ms,
            event,
        }
    }
}

/// Subscription filter over event kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter for specific event kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self { kinds }
    }

    /// Check whether an envelope matches this filter.
    #[must_use]
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&envelope.event.kind())
    }
}
