//! Outbound (driven) ports: the remote authority and the clock.
//!
//! The transport behind [`MutationGateway`] and [`TileQuerySource`] is out
//! of scope for the cache; anything async and fallible fits. A rejection
//! from any mutation means nothing happened server-side.

use crate::domain::{GatewayError, ItemId, TileUpdate};
use async_trait::async_trait;
use hexmap_coords::CoordId;
use serde::{Deserialize, Serialize};

/// Input for creating a tile at a specific coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItemInput {
    pub coord_id: CoordId,
    pub parent_id: Option<ItemId>,
    pub title: String,
    pub content: String,
    pub preview: Option<String>,
    pub link: String,
    pub color_tag: String,
}

/// Authoritative result of a create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedItem {
    pub id: ItemId,
    pub title: String,
}

/// Input for updating a tile's fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemInput {
    pub id: ItemId,
    pub coord_id: CoordId,
    pub update: TileUpdate,
}

/// Input for deleting a tile and the subtree it contains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItemInput {
    pub id: ItemId,
    pub coord_id: CoordId,
}

/// Acknowledgement shape for update/delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationAck {
    pub success: bool,
}

/// A move request: source subtree onto target coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveItemRequest {
    pub source: CoordId,
    pub target: CoordId,
}

/// One tile as reported by the remote authority.
///
/// `coordinates` is the authoritative coordinate id as a raw string; the
/// cache parses it on receipt and must tolerate ids it never had cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTile {
    pub id: ItemId,
    pub coordinates: String,
    pub title: String,
    pub content: String,
    pub preview: Option<String>,
    pub link: String,
    pub color_tag: String,
    pub depth: usize,
    pub parent_id: Option<ItemId>,
    pub owner_id: i64,
}

/// Authoritative result of a move: the moved root plus every tile whose
/// coordinates changed as a side effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub moved_item_id: ItemId,
    pub modified_items: Vec<RemoteTile>,
}

/// The remote mutation authority.
///
/// The coordinator performs at most one in-flight call per logical edit,
/// so implementations may treat each call as idempotent. Timeouts are the
/// gateway's responsibility and surface as [`GatewayError::Timeout`].
#[async_trait]
pub trait MutationGateway: Send + Sync {
    async fn create_item(&self, input: CreateItemInput) -> Result<CreatedItem, GatewayError>;

    async fn update_item(&self, input: UpdateItemInput) -> Result<MutationAck, GatewayError>;

    async fn delete_item(&self, input: DeleteItemInput) -> Result<MutationAck, GatewayError>;

    async fn move_item(&self, request: MoveItemRequest) -> Result<MoveOutcome, GatewayError>;
}

/// Read side of the remote authority: region and children queries.
#[async_trait]
pub trait TileQuerySource: Send + Sync {
    /// Fetch every tile within `depth` generations of `center`.
    async fn fetch_region(
        &self,
        center: CoordId,
        depth: usize,
    ) -> Result<Vec<RemoteTile>, GatewayError>;

    /// Fetch the direct children of one tile.
    async fn fetch_children(&self, parent: CoordId) -> Result<Vec<RemoteTile>, GatewayError>;
}

/// Time source for event envelope timestamps.
///
/// Abstracted so tests run with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Fixed time source for tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct MockTimeSource(pub u64);

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now_ms(&self) -> u64 {
        self.0
    }
}
