//! Tile entities held by the normalized store.

use hexmap_coords::{Coord, CoordId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix of provisional item ids minted during optimistic creates.
const PROVISIONAL_PREFIX: &str = "tmp-";

/// Server-side identifier of a tile.
///
/// During an optimistic create the record carries a provisional id; the
/// finalize step replaces it with the authoritative one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Mint a fresh provisional id for an optimistic insert.
    #[must_use]
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_PREFIX}{}", Uuid::new_v4()))
    }

    /// True for ids minted by [`ItemId::provisional`].
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation-only flags. Never consulted by mutation logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUiState {
    pub dragged: bool,
    pub hovered: bool,
    pub selected: bool,
    pub expanded: bool,
}

/// One tile in the normalized store, keyed by its coordinate id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub coord: Coord,
    pub item_id: ItemId,
    pub parent_coord_id: Option<CoordId>,
    pub depth: usize,
    pub owner_id: i64,
    pub title: String,
    pub content: String,
    pub preview: Option<String>,
    pub link: String,
    pub color_tag: String,
    pub ui_state: TileUiState,
}

impl TileRecord {
    /// Build a record at `coord` from user-entered fields.
    pub fn from_draft(coord: Coord, item_id: ItemId, draft: &TileDraft) -> Self {
        let parent_coord_id = coord.parent().map(CoordId::from);
        let depth = coord.depth();
        let owner_id = coord.owner_id;
        Self {
            coord,
            item_id,
            parent_coord_id,
            depth,
            owner_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            preview: draft.preview.clone(),
            link: draft.link.clone(),
            color_tag: draft.color_tag.clone(),
            ui_state: TileUiState::default(),
        }
    }

    /// Canonical store key of this record.
    #[must_use]
    pub fn coord_id(&self) -> CoordId {
        self.coord.id()
    }

    /// Copy of this record with `update`'s present fields merged in.
    #[must_use]
    pub fn with_update(&self, update: &TileUpdate) -> Self {
        let mut next = self.clone();
        if let Some(title) = &update.title {
            next.title = title.clone();
        }
        if let Some(content) = &update.content {
            next.content = content.clone();
        }
        if let Some(preview) = &update.preview {
            next.preview = Some(preview.clone());
        }
        if let Some(link) = &update.link {
            next.link = link.clone();
        }
        if let Some(color_tag) = &update.color_tag {
            next.color_tag = color_tag.clone();
        }
        next
    }

    /// Copy of this record re-addressed at `coord`, with the derived
    /// fields (depth, parent id, owner) recomputed.
    #[must_use]
    pub fn at_coord(&self, coord: Coord) -> Self {
        let mut next = self.clone();
        next.parent_coord_id = coord.parent().map(CoordId::from);
        next.depth = coord.depth();
        next.owner_id = coord.owner_id;
        next.coord = coord;
        next
    }
}

/// Fields for creating a tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDraft {
    pub title: String,
    pub content: String,
    pub preview: Option<String>,
    pub link: String,
    pub color_tag: String,
}

impl TileDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a tile; `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub preview: Option<String>,
    pub link: Option<String>,
    pub color_tag: Option<String>,
}
