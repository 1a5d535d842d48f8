//! Structural edits: the optimistic mutation protocol.
//!
//! Every edit follows the same three phases:
//!
//! 1. **snapshot** - clone the affected records while validating inputs;
//!    nothing is dispatched if validation fails
//! 2. **optimistic apply** - patch the store synchronously, before the
//!    first await point, so readers render the result immediately
//! 3. **await the gateway** - on success, reconcile with the authoritative
//!    payload and publish exactly one event; on failure, restore the
//!    snapshot verbatim and surface the error with no event
//!
//! The methods take `&mut self`, so two edits on one service can never
//! interleave between phases.

use crate::domain::{CacheAction, CacheError, GatewayError, ItemId, TileDraft, TileRecord, TileUpdate};
use crate::ports::{
    CreateItemInput, DeleteItemInput, MoveItemRequest, MoveOutcome, MutationGateway,
    TileQuerySource, TimeSource, UpdateItemInput,
};
use crate::service::{record_from_remote, MapCacheService};
use hexmap_bus::MapEvent;
use hexmap_coords::{Coord, CoordId};
use std::collections::HashSet;
use tracing::{debug, warn};

impl<G, Q, T> MapCacheService<G, Q, T>
where
    G: MutationGateway,
    Q: TileQuerySource,
    T: TimeSource,
{
    /// Create a tile in the first free primary slot under a parent.
    pub(crate) async fn create_in_first_slot(
        &mut self,
        parent_coord_id: &str,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError> {
        let parent = CoordId::parse(parent_coord_id)?;
        let slot = self
            .store
            .with(|s| s.first_available_child_slot(parent.coord()))
            .ok_or_else(|| CacheError::SubtreeFull {
                parent: parent.to_string(),
            })?;
        self.create_at_coord(slot, draft).await
    }

    /// Create a tile at an explicit coordinate.
    pub(crate) async fn create_at_coord(
        &mut self,
        coord: Coord,
        draft: TileDraft,
    ) -> Result<TileRecord, CacheError> {
        if draft.title.trim().is_empty() {
            return Err(CacheError::EmptyTitle);
        }
        let coord_id = coord.id();
        if self.store.with(|s| s.contains(coord_id.as_str())) {
            return Err(CacheError::Occupied {
                coord_id: coord_id.to_string(),
            });
        }

        let parent_item_id = coord.parent().and_then(|parent| {
            self.store
                .with(|s| s.get(parent.id().as_str()).map(|r| r.item_id.clone()))
        });

        // Optimistic insert with a provisional id.
        let provisional = TileRecord::from_draft(coord, ItemId::provisional(), &draft);
        self.store
            .dispatch(CacheAction::InsertItems(vec![provisional.clone()]));
        debug!(coord = %coord_id, "Optimistic create applied");

        let input = CreateItemInput {
            coord_id: coord_id.clone(),
            parent_id: parent_item_id,
            title: draft.title,
            content: draft.content,
            preview: draft.preview,
            link: draft.link,
            color_tag: draft.color_tag,
        };
        match self.gateway.create_item(input).await {
            Ok(created) => {
                // Same coordinate, authoritative identity.
                let mut record = provisional;
                record.item_id = created.id.clone();
                record.title = created.title.clone();
                self.store
                    .dispatch(CacheAction::InsertItems(vec![record.clone()]));
                self.emit(MapEvent::TileCreated {
                    tile_id: created.id.to_string(),
                    tile_name: created.title,
                })
                .await;
                Ok(record)
            }
            Err(error) => {
                self.store.dispatch(CacheAction::RemoveItem(coord_id.clone()));
                warn!(coord = %coord_id, %error, "Create rolled back");
                Err(error.into())
            }
        }
    }

    /// Merge fields into the tile at `coord_id`.
    pub(crate) async fn update_at(
        &mut self,
        coord_id: &str,
        update: TileUpdate,
    ) -> Result<TileRecord, CacheError> {
        let id = CoordId::parse(coord_id)?;
        let snapshot = self
            .store
            .with(|s| s.get(id.as_str()).cloned())
            .ok_or_else(|| CacheError::MissingItem {
                coord_id: id.to_string(),
            })?;

        let merged = snapshot.with_update(&update);
        self.store
            .dispatch(CacheAction::InsertItems(vec![merged.clone()]));

        let input = UpdateItemInput {
            id: snapshot.item_id.clone(),
            coord_id: id.clone(),
            update,
        };
        match self.gateway.update_item(input).await {
            Ok(ack) if ack.success => {
                self.emit(MapEvent::TileUpdated {
                    tile_id: merged.item_id.to_string(),
                    tile_name: merged.title.clone(),
                })
                .await;
                Ok(merged)
            }
            Ok(_) => {
                self.store
                    .dispatch(CacheAction::InsertItems(vec![snapshot]));
                warn!(coord = %id, "Update not applied server-side, rolled back");
                Err(GatewayError::Rejected {
                    reason: "update was not applied".to_string(),
                }
                .into())
            }
            Err(error) => {
                self.store
                    .dispatch(CacheAction::InsertItems(vec![snapshot]));
                warn!(coord = %id, %error, "Update rolled back");
                Err(error.into())
            }
        }
    }

    /// Delete the tile at `coord_id` and its whole cached subtree.
    pub(crate) async fn delete_at(&mut self, coord_id: &str) -> Result<(), CacheError> {
        let id = CoordId::parse(coord_id)?;
        let snapshot = self.store.with(|s| s.subtree_records(id.coord()));
        let root = snapshot
            .iter()
            .find(|record| record.coord == *id.coord())
            .cloned()
            .ok_or_else(|| CacheError::MissingItem {
                coord_id: id.to_string(),
            })?;

        for record in &snapshot {
            self.store
                .dispatch(CacheAction::RemoveItem(record.coord_id()));
        }
        debug!(coord = %id, removed = snapshot.len(), "Optimistic delete applied");

        let input = DeleteItemInput {
            id: root.item_id.clone(),
            coord_id: id.clone(),
        };
        match self.gateway.delete_item(input).await {
            Ok(ack) if ack.success => {
                self.emit(MapEvent::TileDeleted {
                    tile_id: root.item_id.to_string(),
                    tile_name: root.title,
                })
                .await;
                Ok(())
            }
            Ok(_) => {
                self.store.dispatch(CacheAction::InsertItems(snapshot));
                warn!(coord = %id, "Delete not applied server-side, rolled back");
                Err(GatewayError::Rejected {
                    reason: "delete was not applied".to_string(),
                }
                .into())
            }
            Err(error) => {
                self.store.dispatch(CacheAction::InsertItems(snapshot));
                warn!(coord = %id, %error, "Delete rolled back");
                Err(error.into())
            }
        }
    }

    /// Move the subtree at `source` onto `target`; swap when the target is
    /// occupied in the local store.
    pub(crate) async fn move_subtree(
        &mut self,
        source_coord_id: &str,
        target_coord_id: &str,
    ) -> Result<(), CacheError> {
        let source = CoordId::parse(source_coord_id)?;
        let target = CoordId::parse(target_coord_id)?;
        if source == target {
            debug!(coord = %source, "Move onto itself ignored");
            return Ok(());
        }
        if target.coord().is_descendant_of(source.coord()) {
            return Err(CacheError::MoveIntoOwnSubtree {
                source_id: source.to_string(),
                target: target.to_string(),
            });
        }

        let source_record = self
            .store
            .with(|s| s.get(source.as_str()).cloned())
            .ok_or_else(|| CacheError::MissingItem {
                coord_id: source.to_string(),
            })?;

        // Occupancy of the target in the local store decides the mode; the
        // authoritative payload corrects us later if that belief is stale.
        let target_record = self.store.with(|s| s.get(target.as_str()).cloned());
        let swap = target_record.is_some();

        let source_snapshot = self.store.with(|s| s.subtree_records(source.coord()));
        let target_snapshot = if swap {
            self.store.with(|s| s.subtree_records(target.coord()))
        } else {
            Vec::new()
        };

        // Compute the full optimistic patch before touching the store.
        let mut optimistic = Vec::with_capacity(source_snapshot.len() + target_snapshot.len());
        for record in &source_snapshot {
            let rebased = record.coord.rebased(source.coord(), target.coord())?;
            optimistic.push(record.at_coord(rebased));
        }
        for record in &target_snapshot {
            let rebased = record.coord.rebased(target.coord(), source.coord())?;
            optimistic.push(record.at_coord(rebased));
        }

        for record in source_snapshot.iter().chain(target_snapshot.iter()) {
            self.store
                .dispatch(CacheAction::RemoveItem(record.coord_id()));
        }
        self.store
            .dispatch(CacheAction::InsertItems(optimistic.clone()));
        debug!(
            source = %source,
            target = %target,
            swap,
            rebased = optimistic.len(),
            "Optimistic move applied"
        );

        let request = MoveItemRequest {
            source: source.clone(),
            target: target.clone(),
        };
        match self.gateway.move_item(request).await {
            Ok(outcome) => {
                self.finalize_move(&source_snapshot, &target_snapshot, &optimistic, &outcome);
                if swap {
                    // target_record is present whenever swap is true.
                    let target_record = target_record.unwrap_or_else(|| source_record.clone());
                    self.emit(MapEvent::TilesSwapped {
                        tile1_id: source_record.item_id.to_string(),
                        tile1_name: source_record.title,
                        tile2_id: target_record.item_id.to_string(),
                        tile2_name: target_record.title,
                    })
                    .await;
                } else {
                    self.emit(MapEvent::TileMoved {
                        tile_id: outcome.moved_item_id.to_string(),
                        tile_name: source_record.title,
                        from_coord_id: source,
                        to_coord_id: target,
                    })
                    .await;
                }
                Ok(())
            }
            Err(error) => {
                // Restore both snapshots verbatim.
                for record in &optimistic {
                    self.store
                        .dispatch(CacheAction::RemoveItem(record.coord_id()));
                }
                let restored: Vec<TileRecord> = source_snapshot
                    .into_iter()
                    .chain(target_snapshot)
                    .collect();
                self.store.dispatch(CacheAction::InsertItems(restored));
                warn!(source = %source, target = %target, %error, "Move rolled back");
                Err(error.into())
            }
        }
    }

    /// Reconcile the store with the authoritative move payload.
    ///
    /// Removes every id the moved subtree(s) occupied before the move and
    /// every optimistic guess the authoritative payload does not confirm,
    /// then inserts the authoritative records. Records the authority
    /// reports for tiles we never had cached are inserted anyway.
    fn finalize_move(
        &self,
        source_snapshot: &[TileRecord],
        target_snapshot: &[TileRecord],
        optimistic: &[TileRecord],
        outcome: &MoveOutcome,
    ) {
        let known_items: HashSet<&ItemId> = source_snapshot
            .iter()
            .chain(target_snapshot.iter())
            .map(|record| &record.item_id)
            .collect();

        let mut authoritative = Vec::with_capacity(outcome.modified_items.len());
        for item in &outcome.modified_items {
            match record_from_remote(item) {
                Ok(record) => {
                    if !known_items.contains(&record.item_id) {
                        warn!(
                            item = %record.item_id,
                            coord = %record.coord_id(),
                            "Authoritative move payload includes a tile the cache never held"
                        );
                    }
                    authoritative.push(record);
                }
                Err(error) => {
                    warn!(
                        coordinates = %item.coordinates,
                        %error,
                        "Skipping authoritative record with malformed coordinates"
                    );
                }
            }
        }

        let confirmed: HashSet<CoordId> = authoritative
            .iter()
            .map(TileRecord::coord_id)
            .collect();
        let mut stale: HashSet<CoordId> = HashSet::new();
        for record in source_snapshot
            .iter()
            .chain(target_snapshot.iter())
            .chain(optimistic.iter())
        {
            stale.insert(record.coord_id());
        }
        for id in stale {
            if !confirmed.contains(&id) {
                self.store.dispatch(CacheAction::RemoveItem(id));
            }
        }
        let inserted = authoritative.len();
        self.store.dispatch(CacheAction::InsertItems(authoritative));
        debug!(inserted, "Move finalized with authoritative records");
    }
}
