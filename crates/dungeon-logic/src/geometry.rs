//! Tile-grid geometry: integer tile positions, inclusive tile rectangles
//! and the continuous world positions used at runtime.

use serde::{Deserialize, Serialize};

/// A tile coordinate. `y` grows north.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World position of this tile's lower-left corner.
    pub fn to_world(self, tile_size: f32) -> WorldPos {
        WorldPos::new(self.x as f32 * tile_size, self.y as f32 * tile_size)
    }
}

impl std::ops::Add for GridPos {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for GridPos {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A continuous 2D position in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned tile rectangle with inclusive bounds on both ends.
///
/// A rectangle from (0,0) to (0,0) covers exactly one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub lower: GridPos,
    pub upper: GridPos,
}

impl TileRect {
    pub fn new(lower: GridPos, upper: GridPos) -> Self {
        Self { lower, upper }
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.upper.x - self.lower.x + 1
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.upper.y - self.lower.y + 1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Move the rectangle by `offset` tiles.
    pub fn translated(&self, offset: GridPos) -> Self {
        Self::new(self.lower + offset, self.upper + offset)
    }

    /// Grow the rectangle by `margin` tiles on every side.
    pub fn expanded(&self, margin: i32) -> Self {
        Self::new(
            GridPos::new(self.lower.x - margin, self.lower.y - margin),
            GridPos::new(self.upper.x + margin, self.upper.y + margin),
        )
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.lower.x && pos.x <= self.upper.x && pos.y >= self.lower.y && pos.y <= self.upper.y
    }

    /// Inclusive interval overlap on both axes: rectangles that share a tile overlap,
    /// rectangles that merely sit side by side do not.
    pub fn overlaps(&self, other: &TileRect) -> bool {
        intervals_overlap(self.lower.x, self.upper.x, other.lower.x, other.upper.x)
            && intervals_overlap(self.lower.y, self.upper.y, other.lower.y, other.upper.y)
    }

    /// Overlap test with `padding` tiles of clearance required around `self`.
    pub fn overlaps_with_padding(&self, other: &TileRect, padding: i32) -> bool {
        self.expanded(padding.max(0)).overlaps(other)
    }

    /// World-space extent: `(min, max)` corners, covering every tile completely.
    pub fn world_extent(&self, tile_size: f32) -> (WorldPos, WorldPos) {
        (
            self.lower.to_world(tile_size),
            (self.upper + GridPos::new(1, 1)).to_world(tile_size),
        )
    }

    pub fn world_center(&self, tile_size: f32) -> WorldPos {
        let (min, max) = self.world_extent(tile_size);
        WorldPos::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0)
    }

    /// Check whether a world position lies inside the rectangle's world extent.
    /// The max edge is exclusive so that adjacent rooms never both claim a point.
    pub fn contains_world(&self, pos: WorldPos, tile_size: f32) -> bool {
        let (min, max) = self.world_extent(tile_size);
        pos.x >= min.x && pos.x < max.x && pos.y >= min.y && pos.y < max.y
    }
}

fn intervals_overlap(min1: i32, max1: i32, min2: i32, max2: i32) -> bool {
    min1.max(min2) <= max1.min(max2)
}
