//! # Map Cache Service
//!
//! The service owning the normalized store. Structural edits follow the
//! optimistic protocol in `mutation.rs`; this module holds construction,
//! the region load/invalidate paths, and view-state transitions.
//!
//! ## Architecture
//!
//! The service is generic over its outbound ports and uses dependency
//! injection for all of them:
//! - `G`: the remote mutation authority
//! - `Q`: the remote query source
//! - `T`: the clock stamping event envelopes
//!
//! The event bus is an optional collaborator; without one the service gets
//! the no-op bus and publishes nowhere.

mod mutation;

use crate::config::CacheConfig;
use crate::domain::{
    CacheAction, CacheError, ItemId, StoreHandle, TileDraft, TileRecord, TileUiState, TileUpdate,
};
use crate::ports::{MapCacheApi, MutationGateway, RemoteTile, TileQuerySource, TimeSource};
use async_trait::async_trait;
use hexmap_bus::{EventEnvelope, EventPublisher, MapEvent, NoopEventBus};
use hexmap_coords::{Coord, CoordId};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The map cache: normalized store plus mutation coordinator.
pub struct MapCacheService<G, Q, T>
where
    G: MutationGateway,
    Q: TileQuerySource,
    T: TimeSource,
{
    /// Remote mutation authority.
    gateway: G,
    /// Remote query source for region loads.
    query: Q,
    /// Clock for event envelope timestamps.
    time: T,
    /// The shared store handle; readers hold clones of this.
    store: StoreHandle,
    /// Event bus; the no-op bus when none is configured.
    events: Arc<dyn EventPublisher>,
    /// Tuning knobs.
    config: CacheConfig,
}

impl<G, Q, T> MapCacheService<G, Q, T>
where
    G: MutationGateway,
    Q: TileQuerySource,
    T: TimeSource,
{
    /// Create a service with no event bus configured.
    pub fn new(gateway: G, query: Q, time: T, config: CacheConfig) -> Self {
        let store = StoreHandle::new(config.action_log_capacity);
        Self {
            gateway,
            query,
            time,
            store,
            events: Arc::new(NoopEventBus),
            config,
        }
    }

    /// Attach an event bus.
    #[must_use]
    pub fn with_event_bus(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    /// A reader handle onto the live store (provisional state included).
    #[must_use]
    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    /// Total envelopes published by this service's bus.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events.events_published()
    }

    /// Move the visual center.
    pub fn set_center(&self, coord_id: &str) -> Result<(), CacheError> {
        let id = CoordId::parse(coord_id)?;
        self.store.dispatch(CacheAction::SetCenter(id));
        Ok(())
    }

    /// Expand or collapse one tile.
    pub fn set_expansion(&self, item_id: &str, expanded: bool) {
        self.store.dispatch(CacheAction::SetExpansion {
            item_id: ItemId::new(item_id),
            expanded,
        });
    }

    /// Flip one tile's expansion state.
    pub fn toggle_expansion(&self, item_id: &str) {
        let id = ItemId::new(item_id);
        let expanded = self.store.with(|s| s.expanded_item_ids.contains(&id));
        self.store.dispatch(CacheAction::SetExpansion {
            item_id: id,
            expanded: !expanded,
        });
    }

    /// Expand or collapse the composition layer.
    pub fn set_composition_expanded(&self, expanded: bool) {
        self.store
            .dispatch(CacheAction::SetCompositionExpansion(expanded));
    }

    /// Publish one domain event through the configured bus.
    pub(crate) async fn emit(&self, event: MapEvent) {
        let envelope = EventEnvelope::new(event, self.time.now_ms());
        let receivers = self.events.publish(envelope).await;
        trace!(receivers, "Domain event published");
    }

    /// Insert remote tiles, skipping (and logging) any with a malformed
    /// authoritative coordinate.
    fn insert_remote_tiles(&self, tiles: &[RemoteTile]) -> usize {
        let mut records = Vec::with_capacity(tiles.len());
        for tile in tiles {
            match record_from_remote(tile) {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(
                        coordinates = %tile.coordinates,
                        %error,
                        "Skipping remote tile with malformed coordinates"
                    );
                }
            }
        }
        let count = records.len();
        if count > 0 {
            self.store.dispatch(CacheAction::InsertItems(records));
        }
        count
    }

    async fn load_region_inner(&mut self, center: CoordId, depth: usize) -> Result<usize, CacheError> {
        let tiles = self.query.fetch_region(center.clone(), depth).await?;
        let count = self.insert_remote_tiles(&tiles);
        debug!(center = %center, depth, inserted = count, "Region loaded");
        Ok(count)
    }

    /// Remove every cached record under `prefix`, prefix included.
    fn invalidate_prefix(&self, prefix: &Coord) -> usize {
        let stale: Vec<CoordId> = self.store.with(|s| {
            s.items()
                .filter(|(_, record)| record.coord.has_prefix(prefix))
                .map(|(id, _)| id.clone())
                .collect()
        });
        for id in &stale {
            self.store.dispatch(CacheAction::RemoveItem(id.clone()));
        }
        stale.len()
    }
}

#[async_trait]
impl<G, Q, T> MapCacheApi for MapCacheService<G, Q, T>
where
    G: MutationGateway,
    Q: TileQuerySource,
    T: TimeSource,
{
    async fn create_item(
        &mut self,
        parent_coord_id: &str,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError> {
        self.create_in_first_slot(parent_coord_id, draft).await
    }

    async fn create_item_at(
        &mut self,
        coord_id: &str,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError> {
        let id = CoordId::parse(coord_id)?;
        self.create_at_coord(id.coord().clone(), draft).await
    }

    async fn update_item(
        &mut self,
        coord_id: &str,
        update: TileUpdate,
    ) -> Result<TileRecord, CacheError> {
        self.update_at(coord_id, update).await
    }

    async fn delete_item(&mut self, coord_id: &str) -> Result<(), CacheError> {
        self.delete_at(coord_id).await
    }

    async fn move_item(
        &mut self,
        source_coord_id: &str,
        target_coord_id: &str,
    ) -> Result<(), CacheError> {
        self.move_subtree(source_coord_id, target_coord_id).await
    }

    async fn load_region(&mut self, center_coord_id: &str) -> Result<usize, CacheError> {
        let center = CoordId::parse(center_coord_id)?;
        let count = self
            .load_region_inner(center.clone(), self.config.region_depth)
            .await?;
        self.store.dispatch(CacheAction::SetCenter(center));
        Ok(count)
    }

    async fn load_item_children(&mut self, coord_id: &str) -> Result<usize, CacheError> {
        let parent = CoordId::parse(coord_id)?;
        let tiles = self.query.fetch_children(parent.clone()).await?;
        let count = self.insert_remote_tiles(&tiles);
        debug!(parent = %parent, inserted = count, "Children loaded");
        Ok(count)
    }

    async fn prefetch_region(&mut self, center_coord_id: &str) -> Result<(), CacheError> {
        let center = CoordId::parse(center_coord_id)?;
        let depth = self.config.prefetch_depth;
        if let Err(error) = self.load_region_inner(center.clone(), depth).await {
            // Prefetch is opportunistic; a failed fetch leaves the cache as-is.
            warn!(center = %center, %error, "Prefetch failed");
        }
        Ok(())
    }

    async fn invalidate_region(&mut self, prefix_coord_id: &str) -> Result<usize, CacheError> {
        let prefix = CoordId::parse(prefix_coord_id)?;
        let removed = self.invalidate_prefix(prefix.coord());
        debug!(prefix = %prefix, removed, "Region invalidated");
        Ok(removed)
    }

    async fn invalidate_all(&mut self) -> Result<usize, CacheError> {
        let all: Vec<CoordId> = self
            .store
            .with(|s| s.items().map(|(id, _)| id.clone()).collect());
        for id in &all {
            self.store.dispatch(CacheAction::RemoveItem(id.clone()));
        }
        debug!(removed = all.len(), "Cache cleared");
        Ok(all.len())
    }
}

/// Build a store record from a remote tile, deriving position fields from
/// the authoritative coordinate string.
pub(crate) fn record_from_remote(remote: &RemoteTile) -> Result<TileRecord, hexmap_coords::CoordError> {
    let coord: Coord = remote.coordinates.parse()?;
    Ok(TileRecord {
        parent_coord_id: coord.parent().map(CoordId::from),
        depth: coord.depth(),
        owner_id: coord.owner_id,
        coord,
        item_id: remote.id.clone(),
        title: remote.title.clone(),
        content: remote.content.clone(),
        preview: remote.preview.clone(),
        link: remote.link.clone(),
        color_tag: remote.color_tag.clone(),
        ui_state: TileUiState::default(),
    })
}
