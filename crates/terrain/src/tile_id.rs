use serde::{Deserialize, Serialize};

/// Quadtree tile address: level of detail plus grid coordinates.
///
/// `x` grows east and `y` grows south, so `(0, 0)` is the north-west tile of
/// every level. Level `lod` is a `2^lod × 2^lod` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub lod: u8,
    pub x: u32,
    pub y: u32,
}

/// Deepest level whose grid still fits the `u32` coordinates.
pub const MAX_LOD: u8 = 31;

impl TileId {
    pub fn new(lod: u8, x: u32, y: u32) -> Self {
        Self { lod, x, y }
    }

    pub fn root() -> Self {
        Self::new(0, 0, 0)
    }

    /// Number of tiles along one axis at this level.
    pub fn grid_size(lod: u8) -> u64 {
        1u64 << lod
    }

    pub fn parent(self) -> Option<TileId> {
        self.ancestor_at(self.lod.checked_sub(1)?)
    }

    /// The four children in row order: north-west, north-east, south-west, south-east.
    pub fn children(self) -> [TileId; 4] {
        let lod = self.lod + 1;
        let (x, y) = (self.x * 2, self.y * 2);
        [
            TileId::new(lod, x, y),
            TileId::new(lod, x + 1, y),
            TileId::new(lod, x, y + 1),
            TileId::new(lod, x + 1, y + 1),
        ]
    }

    /// The tile at `lod` that contains this one, obtained by shifting the
    /// coordinates by the level difference.
    pub fn ancestor_at(self, lod: u8) -> Option<TileId> {
        if lod > self.lod {
            return None;
        }
        let shift = self.lod - lod;
        Some(TileId::new(lod, self.x >> shift, self.y >> shift))
    }

    /// True when `self` lies inside `other`'s subtree (or is `other`).
    pub fn is_within(self, other: TileId) -> bool {
        self.ancestor_at(other.lod) == Some(other)
    }

    /// Neighbour at a grid offset on the same level, if it exists.
    pub fn offset(self, dx: i64, dy: i64) -> Option<TileId> {
        let size = Self::grid_size(self.lod) as i64;
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;
        if !(0..size).contains(&x) || !(0..size).contains(&y) {
            return None;
        }
        Some(TileId::new(self.lod, x as u32, y as u32))
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.lod, self.x, self.y)
    }
}
