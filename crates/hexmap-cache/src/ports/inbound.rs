//! Inbound (driving) port: the API the rest of the application uses.
//!
//! Coordinate ids arrive as raw strings because that is how callers hold
//! them; every method validates before touching the store, so a malformed
//! id can never trigger an optimistic apply.

use crate::domain::{CacheError, TileDraft, TileRecord, TileUpdate};
use async_trait::async_trait;

/// The map cache's public surface.
///
/// Structural edits take `&mut self`: one cache instance never interleaves
/// two edits, which is what makes snapshot/rollback sound.
#[async_trait]
pub trait MapCacheApi: Send {
    /// Create a tile in the first free child slot of `parent_coord_id`.
    async fn create_item(
        &mut self,
        parent_coord_id: &str,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError>;

    /// Create a tile at an explicit coordinate (composition containers,
    /// restored tiles).
    async fn create_item_at(
        &mut self,
        coord_id: &str,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError>;

    /// Merge fields into the tile at `coord_id`.
    async fn update_item(
        &mut self,
        coord_id: &str,
        update: TileUpdate,
    ) -> Result<TileRecord, CacheError>;

    /// Delete the tile at `coord_id` and everything it contains.
    async fn delete_item(&mut self, coord_id: &str) -> Result<(), CacheError>;

    /// Move the subtree at `source_coord_id` onto `target_coord_id`;
    /// becomes a swap when the target is occupied locally.
    async fn move_item(
        &mut self,
        source_coord_id: &str,
        target_coord_id: &str,
    ) -> Result<(), CacheError>;

    /// Bulk-load the region around a center and make it the center.
    /// Returns the number of records inserted.
    async fn load_region(&mut self, center_coord_id: &str) -> Result<usize, CacheError>;

    /// Load the direct children of one tile.
    async fn load_item_children(&mut self, coord_id: &str) -> Result<usize, CacheError>;

    /// Background-priority region fetch; failures are logged, not surfaced.
    async fn prefetch_region(&mut self, center_coord_id: &str) -> Result<(), CacheError>;

    /// Drop every cached record under a coordinate prefix (prefix
    /// included). Returns the number of records removed.
    async fn invalidate_region(&mut self, prefix_coord_id: &str) -> Result<usize, CacheError>;

    /// Drop every cached record.
    async fn invalidate_all(&mut self) -> Result<usize, CacheError>;
}
