//! Coordinates and their canonical string ids.
//!
//! The canonical id format is `"{owner},{group}:{step,step,...}"`. The colon
//! is always present; a root coordinate (empty path) keeps an empty path
//! segment, e.g. `"1,0:"`. Parsing and formatting are exact inverses for
//! every canonical id.

use crate::direction::{Direction, PathStep};
use crate::errors::CoordError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Hierarchical address of a tile: owner, group, and the directional path
/// from the group root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub owner_id: i64,
    pub group_id: i64,
    pub path: Vec<PathStep>,
}

impl Coord {
    pub fn new(owner_id: i64, group_id: i64, path: Vec<PathStep>) -> Self {
        Self {
            owner_id,
            group_id,
            path,
        }
    }

    /// The root (user) tile of a group: empty path.
    pub fn root(owner_id: i64, group_id: i64) -> Self {
        Self::new(owner_id, group_id, Vec::new())
    }

    /// Depth of this coordinate: the number of steps from the group root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Canonical string id of this coordinate.
    pub fn id(&self) -> CoordId {
        CoordId::from(self)
    }

    /// Parent coordinate, or `None` for a root tile.
    pub fn parent(&self) -> Option<Coord> {
        if self.path.is_empty() {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(Coord::new(self.owner_id, self.group_id, path))
    }

    /// The child one step away.
    pub fn step(&self, step: PathStep) -> Coord {
        let mut path = self.path.clone();
        path.push(step);
        Coord::new(self.owner_id, self.group_id, path)
    }

    /// The six primary children, in the fixed NW/NE/E/SE/SW/W order.
    pub fn child_coords(&self) -> [Coord; 6] {
        Direction::ALL.map(|dir| self.step(PathStep::Child(dir)))
    }

    /// The composition container child (reserved slot 0).
    pub fn composition_container(&self) -> Coord {
        self.step(PathStep::Composition)
    }

    /// The six composed children: negative-index slots under the
    /// composition container.
    pub fn composed_children(&self) -> [Coord; 6] {
        let container = self.composition_container();
        Direction::ALL.map(|dir| container.step(PathStep::Composed(dir)))
    }

    /// True iff `prefix`'s path is a (not necessarily proper) positional
    /// prefix of this coordinate's path, within the same owner and group.
    pub fn has_prefix(&self, prefix: &Coord) -> bool {
        self.owner_id == prefix.owner_id
            && self.group_id == prefix.group_id
            && self.path.len() >= prefix.path.len()
            && self.path[..prefix.path.len()] == prefix.path[..]
    }

    /// True iff this coordinate lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Coord) -> bool {
        self.path.len() > ancestor.path.len() && self.has_prefix(ancestor)
    }

    /// Re-address this coordinate from one subtree root to another.
    ///
    /// Replaces the leading `old_prefix` of the path with `new_prefix`,
    /// keeping the remaining suffix unchanged. The relative position inside
    /// the subtree is preserved exactly; depth changes only by the
    /// difference of the two prefix lengths.
    pub fn rebased(&self, old_prefix: &Coord, new_prefix: &Coord) -> Result<Coord, CoordError> {
        if !self.has_prefix(old_prefix) {
            return Err(CoordError::NotAPrefix {
                coord: self.id().to_string(),
                prefix: old_prefix.id().to_string(),
            });
        }
        let suffix = &self.path[old_prefix.path.len()..];
        let mut path = new_prefix.path.clone();
        path.extend_from_slice(suffix);
        Ok(Coord::new(new_prefix.owner_id, new_prefix.group_id, path))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}:", self.owner_id, self.group_id)?;
        for (i, step) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", step.index())?;
        }
        Ok(())
    }
}

impl FromStr for Coord {
    type Err = CoordError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let (header, path_part) = id.split_once(':').ok_or_else(|| {
            CoordError::MissingSeparator { id: id.to_string() }
        })?;

        let (owner, group) = header.split_once(',').ok_or_else(|| {
            CoordError::MalformedHeader {
                header: header.to_string(),
            }
        })?;
        let owner_id: i64 = owner.parse().map_err(|_| CoordError::MalformedHeader {
            header: header.to_string(),
        })?;
        let group_id: i64 = group.parse().map_err(|_| CoordError::MalformedHeader {
            header: header.to_string(),
        })?;

        let mut path = Vec::new();
        if !path_part.is_empty() {
            for segment in path_part.split(',') {
                if segment.is_empty() {
                    return Err(CoordError::EmptySegment { id: id.to_string() });
                }
                let index: i64 = segment.parse().map_err(|_| CoordError::MalformedStep {
                    segment: segment.to_string(),
                })?;
                let index =
                    i8::try_from(index).map_err(|_| CoordError::InvalidStepIndex { index })?;
                path.push(PathStep::from_index(index)?);
            }
        }

        Ok(Coord::new(owner_id, group_id, path))
    }
}

/// Canonical string id of a [`Coord`], the sole key used by the cache.
///
/// Holds both the canonical text and the parsed coordinate, so lookups by
/// string and structural operations are both cheap and neither can drift
/// from the other. Equality and hashing use the text only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoordId {
    text: String,
    coord: Coord,
}

impl CoordId {
    /// Parse and validate a coordinate id.
    pub fn parse(id: &str) -> Result<Self, CoordError> {
        let coord: Coord = id.parse()?;
        Ok(Self {
            text: coord.to_string(),
            coord,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn coord(&self) -> &Coord {
        &self.coord
    }
}

impl From<&Coord> for CoordId {
    fn from(coord: &Coord) -> Self {
        Self {
            text: coord.to_string(),
            coord: coord.clone(),
        }
    }
}

impl From<Coord> for CoordId {
    fn from(coord: Coord) -> Self {
        Self {
            text: coord.to_string(),
            coord,
        }
    }
}

impl TryFrom<String> for CoordId {
    type Error = CoordError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        CoordId::parse(&id)
    }
}

impl From<CoordId> for String {
    fn from(id: CoordId) -> String {
        id.text
    }
}

impl FromStr for CoordId {
    type Err = CoordError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        CoordId::parse(id)
    }
}

impl fmt::Display for CoordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for CoordId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for CoordId {}

impl Hash for CoordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Borrow<str> for CoordId {
    fn borrow(&self) -> &str {
        &self.text
    }
}
