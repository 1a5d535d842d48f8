//! Cache and gateway error types.
//!
//! `CacheError::InvalidCoordinate` and friends are raised before any
//! optimistic apply; `CacheError::Gateway` is raised only after the
//! already-applied optimistic patch has been rolled back, so callers always
//! observe a consistent store when they see an error.

use hexmap_coords::CoordError;
use thiserror::Error;

/// Errors surfaced by the map cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Invalid coordinate id: {0}")]
    InvalidCoordinate(#[from] CoordError),

    #[error("No tile cached at {coord_id}")]
    MissingItem { coord_id: String },

    #[error("All six child slots under {parent} are occupied")]
    SubtreeFull { parent: String },

    #[error("A tile is already cached at {coord_id}")]
    Occupied { coord_id: String },

    #[error("Cannot move {source_id} into its own subtree at {target}")]
    MoveIntoOwnSubtree { source_id: String, target: String },

    #[error("Tile title must not be empty")]
    EmptyTitle,

    #[error("Remote mutation failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors from the remote mutation/query gateway.
///
/// A gateway error means "nothing happened server-side": there is no
/// partial-success shape, so rollback is always the right response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Rejected by server: {reason}")]
    Rejected { reason: String },

    #[error("Request timed out")]
    Timeout,
}
