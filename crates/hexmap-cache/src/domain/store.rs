//! The normalized store and its reducer.
//!
//! `MapStore::apply` is a functional update: it never mutates in place, so a
//! pre-mutation snapshot is just a clone and rollback is a re-insert. Tree
//! level invariants (subtree coherence, stale-id cleanup) are the mutation
//! coordinator's responsibility; the store only guarantees well-formed keys,
//! which hold by construction because keys derive from typed coordinates.

use crate::domain::entities::{ItemId, TileRecord};
use hexmap_coords::{Coord, CoordId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// Reducer actions consumed by [`MapStore::apply`].
///
/// Kept as a closed sum so the action log reads as a replayable history.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheAction {
    /// Insert records, replacing any present at the same coordinate ids.
    InsertItems(Vec<TileRecord>),
    /// Remove the record at one coordinate id.
    RemoveItem(CoordId),
    /// Move the visual center.
    SetCenter(CoordId),
    /// Expand or collapse one tile.
    SetExpansion { item_id: ItemId, expanded: bool },
    /// Expand or collapse the composition layer globally.
    SetCompositionExpansion(bool),
}

/// Normalized cache state: tiles keyed by coordinate id, plus view state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapStore {
    items_by_coord_id: HashMap<CoordId, TileRecord>,
    pub center_coord_id: Option<CoordId>,
    pub expanded_item_ids: HashSet<ItemId>,
    pub composition_expanded: bool,
}

impl MapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action, returning the next state.
    #[must_use]
    pub fn apply(&self, action: &CacheAction) -> MapStore {
        let mut next = self.clone();
        match action {
            CacheAction::InsertItems(records) => {
                for record in records {
                    next.items_by_coord_id.insert(record.coord_id(), record.clone());
                }
            }
            CacheAction::RemoveItem(coord_id) => {
                next.items_by_coord_id.remove(coord_id);
            }
            CacheAction::SetCenter(coord_id) => {
                next.center_coord_id = Some(coord_id.clone());
            }
            CacheAction::SetExpansion { item_id, expanded } => {
                if *expanded {
                    next.expanded_item_ids.insert(item_id.clone());
                } else {
                    next.expanded_item_ids.remove(item_id);
                }
            }
            CacheAction::SetCompositionExpansion(expanded) => {
                next.composition_expanded = *expanded;
            }
        }
        next
    }

    pub fn get(&self, coord_id: &str) -> Option<&TileRecord> {
        self.items_by_coord_id.get(coord_id)
    }

    #[must_use]
    pub fn contains(&self, coord_id: &str) -> bool {
        self.items_by_coord_id.contains_key(coord_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items_by_coord_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items_by_coord_id.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&CoordId, &TileRecord)> {
        self.items_by_coord_id.iter()
    }

    /// All cached records of the subtree rooted at `root`, root included.
    #[must_use]
    pub fn subtree_records(&self, root: &Coord) -> Vec<TileRecord> {
        self.items_by_coord_id
            .values()
            .filter(|record| record.coord == *root || record.coord.is_descendant_of(root))
            .cloned()
            .collect()
    }

    /// First unoccupied primary child slot under `parent`, scanning the
    /// fixed NW/NE/E/SE/SW/W order. `None` when the ring is full.
    #[must_use]
    pub fn first_available_child_slot(&self, parent: &Coord) -> Option<Coord> {
        parent
            .child_coords()
            .into_iter()
            .find(|child| !self.contains(child.id().as_str()))
    }
}

/// Shared handle over the store: readers see provisional state live, the
/// coordinator dispatches actions, and a bounded action log records history
/// for diagnostics and tests.
#[derive(Clone)]
pub struct StoreHandle {
    state: Arc<RwLock<MapStore>>,
    action_log: Arc<RwLock<VecDeque<CacheAction>>>,
    log_capacity: usize,
}

impl StoreHandle {
    #[must_use]
    pub fn new(log_capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(MapStore::new())),
            action_log: Arc::new(RwLock::new(VecDeque::new())),
            log_capacity,
        }
    }

    /// Apply one action to the shared state and record it.
    pub fn dispatch(&self, action: CacheAction) {
        trace!(action = ?action, "Dispatching cache action");
        {
            let mut state = self.state.write();
            *state = state.apply(&action);
        }
        let mut log = self.action_log.write();
        if log.len() == self.log_capacity {
            log.pop_front();
        }
        log.push_back(action);
    }

    /// Run a closure against the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&MapStore) -> R) -> R {
        f(&self.state.read())
    }

    /// Deep snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> MapStore {
        self.state.read().clone()
    }

    /// Copy of the recorded action history, oldest first.
    #[must_use]
    pub fn recent_actions(&self) -> Vec<CacheAction> {
        self.action_log.read().iter().cloned().collect()
    }

    /// Drop the recorded history (the state is untouched).
    pub fn clear_action_log(&self) {
        self.action_log.write().clear();
    }
}
