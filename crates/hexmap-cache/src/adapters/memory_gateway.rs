//! In-process remote authority.
//!
//! Holds the authoritative tile table in memory and implements both
//! [`MutationGateway`] and [`TileQuerySource`] against it, including the
//! server-side subtree re-addressing a real move performs. Integration
//! tests run the coordinator against this adapter; `fail_next` injects a
//! rejection into the next mutation call to exercise rollback paths.

use crate::domain::{GatewayError, ItemId};
use crate::ports::{
    CreateItemInput, CreatedItem, DeleteItemInput, MoveItemRequest, MoveOutcome, MutationAck,
    MutationGateway, RemoteTile, TileQuerySource, UpdateItemInput,
};
use async_trait::async_trait;
use hexmap_coords::{Coord, CoordId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Clonable in-memory authority; clones share the same tile table.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    tiles: Arc<RwLock<HashMap<String, RemoteTile>>>,
    next_id: Arc<AtomicI64>,
    fail_next: Arc<Mutex<Option<GatewayError>>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an authoritative tile directly (test seeding).
    pub fn seed(&self, tile: RemoteTile) {
        self.tiles.write().insert(tile.coordinates.clone(), tile);
    }

    /// Seed a minimal tile at `coord_id` with the given id and title.
    pub fn seed_tile(&self, coord_id: &str, id: &str, title: &str) {
        let coord: Coord = match coord_id.parse() {
            Ok(c) => c,
            Err(_) => return,
        };
        self.seed(RemoteTile {
            id: ItemId::new(id),
            coordinates: coord.to_string(),
            title: title.to_string(),
            content: String::new(),
            preview: None,
            link: String::new(),
            color_tag: String::new(),
            depth: coord.depth(),
            parent_id: None,
            owner_id: coord.owner_id,
        });
    }

    /// Make the next mutation call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Number of tiles the authority currently holds.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.read().len()
    }

    /// Authoritative tile at a coordinate id, if any.
    #[must_use]
    pub fn tile_at(&self, coord_id: &str) -> Option<RemoteTile> {
        self.tiles.read().get(coord_id).cloned()
    }

    fn take_failure(&self) -> Option<GatewayError> {
        self.fail_next.lock().take()
    }

    fn mint_id(&self) -> ItemId {
        ItemId::new(format!("srv-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1))
    }

    /// Keys of the subtree rooted at `root`, root included.
    fn subtree_keys(tiles: &HashMap<String, RemoteTile>, root: &Coord) -> Vec<String> {
        tiles
            .keys()
            .filter(|key| {
                key.parse::<Coord>()
                    .map(|coord| coord == *root || coord.is_descendant_of(root))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Rebase one stored subtree, returning the re-addressed tiles.
    fn rebase_subtree(
        tiles: &HashMap<String, RemoteTile>,
        keys: &[String],
        old_root: &Coord,
        new_root: &Coord,
    ) -> Vec<RemoteTile> {
        let mut moved = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(tile) = tiles.get(key) else { continue };
            let Ok(coord) = key.parse::<Coord>() else { continue };
            let Ok(rebased) = coord.rebased(old_root, new_root) else { continue };
            let mut next = tile.clone();
            next.coordinates = rebased.to_string();
            next.depth = rebased.depth();
            next.owner_id = rebased.owner_id;
            moved.push(next);
        }
        moved
    }
}

#[async_trait]
impl MutationGateway for InMemoryGateway {
    async fn create_item(&self, input: CreateItemInput) -> Result<CreatedItem, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let coord = input.coord_id.coord().clone();
        let mut tiles = self.tiles.write();
        if tiles.contains_key(input.coord_id.as_str()) {
            return Err(GatewayError::Rejected {
                reason: format!("coordinate {} is occupied", input.coord_id),
            });
        }
        let id = self.mint_id();
        tiles.insert(
            input.coord_id.as_str().to_string(),
            RemoteTile {
                id: id.clone(),
                coordinates: input.coord_id.as_str().to_string(),
                title: input.title.clone(),
                content: input.content,
                preview: input.preview,
                link: input.link,
                color_tag: input.color_tag,
                depth: coord.depth(),
                parent_id: input.parent_id,
                owner_id: coord.owner_id,
            },
        );
        Ok(CreatedItem {
            id,
            title: input.title,
        })
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<MutationAck, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut tiles = self.tiles.write();
        let Some(tile) = tiles.get_mut(input.coord_id.as_str()) else {
            return Err(GatewayError::Rejected {
                reason: format!("no tile at {}", input.coord_id),
            });
        };
        if let Some(title) = input.update.title {
            tile.title = title;
        }
        if let Some(content) = input.update.content {
            tile.content = content;
        }
        if let Some(preview) = input.update.preview {
            tile.preview = Some(preview);
        }
        if let Some(link) = input.update.link {
            tile.link = link;
        }
        if let Some(color_tag) = input.update.color_tag {
            tile.color_tag = color_tag;
        }
        Ok(MutationAck { success: true })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<MutationAck, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let root = input.coord_id.coord().clone();
        let mut tiles = self.tiles.write();
        let keys = Self::subtree_keys(&tiles, &root);
        if keys.is_empty() {
            return Err(GatewayError::Rejected {
                reason: format!("no tile at {}", input.coord_id),
            });
        }
        for key in keys {
            tiles.remove(&key);
        }
        Ok(MutationAck { success: true })
    }

    async fn move_item(&self, request: MoveItemRequest) -> Result<MoveOutcome, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let source = request.source.coord().clone();
        let target = request.target.coord().clone();
        let mut tiles = self.tiles.write();

        let source_keys = Self::subtree_keys(&tiles, &source);
        if source_keys.is_empty() {
            return Err(GatewayError::Rejected {
                reason: format!("no tile at {}", request.source),
            });
        }
        let moved_item_id = tiles
            .get(request.source.as_str())
            .map(|tile| tile.id.clone())
            .ok_or_else(|| GatewayError::Rejected {
                reason: format!("no tile at {}", request.source),
            })?;

        let swap = tiles.contains_key(request.target.as_str());
        let target_keys = if swap {
            Self::subtree_keys(&tiles, &target)
        } else {
            Vec::new()
        };

        let mut modified = Self::rebase_subtree(&tiles, &source_keys, &source, &target);
        if swap {
            modified.extend(Self::rebase_subtree(&tiles, &target_keys, &target, &source));
        }

        for key in source_keys.iter().chain(target_keys.iter()) {
            tiles.remove(key);
        }
        for tile in &modified {
            tiles.insert(tile.coordinates.clone(), tile.clone());
        }

        Ok(MoveOutcome {
            moved_item_id,
            modified_items: modified,
        })
    }
}

#[async_trait]
impl TileQuerySource for InMemoryGateway {
    async fn fetch_region(
        &self,
        center: CoordId,
        depth: usize,
    ) -> Result<Vec<RemoteTile>, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let root = center.coord().clone();
        let tiles = self.tiles.read();
        Ok(tiles
            .values()
            .filter(|tile| {
                tile.coordinates
                    .parse::<Coord>()
                    .map(|coord| {
                        (coord == root || coord.is_descendant_of(&root))
                            && coord.depth() <= root.depth() + depth
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn fetch_children(&self, parent: CoordId) -> Result<Vec<RemoteTile>, GatewayError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let parent_coord = parent.coord().clone();
        let tiles = self.tiles.read();
        Ok(tiles
            .values()
            .filter(|tile| {
                tile.coordinates
                    .parse::<Coord>()
                    .map(|coord| coord.parent().as_ref() == Some(&parent_coord))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
