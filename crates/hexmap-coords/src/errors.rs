//! Coordinate parsing and rebasing errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("Coordinate id is missing the ':' separator: {id:?}")]
    MissingSeparator { id: String },

    #[error("Malformed owner/group header {header:?} in coordinate id")]
    MalformedHeader { header: String },

    #[error("Invalid path step index: {index}")]
    InvalidStepIndex { index: i64 },

    #[error("Malformed path step segment {segment:?} in coordinate id")]
    MalformedStep { segment: String },

    #[error("Empty path segment in coordinate id {id:?}")]
    EmptySegment { id: String },

    #[error("Coordinate {coord:?} does not start with prefix {prefix:?}")]
    NotAPrefix { coord: String, prefix: String },
}
