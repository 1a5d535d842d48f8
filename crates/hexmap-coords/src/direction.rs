//! Directional steps of a coordinate path.
//!
//! Wire indices: primary children are 1..=6, the composition container is 0,
//! composed children are -1..=-6. The index mapping is part of the id format
//! and must never change.

use crate::errors::CoordError;
use serde::{Deserialize, Serialize};

/// The six primary hex directions, in the fixed child ordering.
///
/// The ordering (NW, NE, E, SE, SW, W) is also the tie-break order for
/// first-empty-slot allocation, so `ALL` must stay in this sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    NorthWest = 1,
    NorthEast = 2,
    East = 3,
    SouthEast = 4,
    SouthWest = 5,
    West = 6,
}

impl Direction {
    /// All six directions in canonical child order.
    pub const ALL: [Direction; 6] = [
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
    ];

    /// Wire index, 1..=6.
    pub fn index(self) -> i8 {
        self as i8
    }

    /// Inverse of [`Direction::index`].
    pub fn from_index(index: i8) -> Result<Self, CoordError> {
        match index {
            1 => Ok(Direction::NorthWest),
            2 => Ok(Direction::NorthEast),
            3 => Ok(Direction::East),
            4 => Ok(Direction::SouthEast),
            5 => Ok(Direction::SouthWest),
            6 => Ok(Direction::West),
            other => Err(CoordError::InvalidStepIndex { index: other as i64 }),
        }
    }
}

/// One step of a coordinate path.
///
/// Serialized as its signed wire index; unknown indices fail to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum PathStep {
    /// Reserved slot 0: the composition container child.
    Composition,
    /// A primary child slot, indices 1..=6.
    Child(Direction),
    /// A composed child slot under the container, indices -1..=-6.
    Composed(Direction),
}

impl PathStep {
    /// Signed wire index of this step.
    pub fn index(self) -> i8 {
        match self {
            PathStep::Composition => 0,
            PathStep::Child(d) => d.index(),
            PathStep::Composed(d) => -d.index(),
        }
    }

    /// Parse a signed wire index into a step.
    pub fn from_index(index: i8) -> Result<Self, CoordError> {
        match index {
            0 => Ok(PathStep::Composition),
            1..=6 => Ok(PathStep::Child(Direction::from_index(index)?)),
            -6..=-1 => Ok(PathStep::Composed(Direction::from_index(-index)?)),
            other => Err(CoordError::InvalidStepIndex { index: other as i64 }),
        }
    }
}

impl From<PathStep> for i8 {
    fn from(step: PathStep) -> i8 {
        step.index()
    }
}

impl TryFrom<i8> for PathStep {
    type Error = CoordError;

    fn try_from(index: i8) -> Result<Self, Self::Error> {
        PathStep::from_index(index)
    }
}
