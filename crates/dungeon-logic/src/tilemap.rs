//! Tile layers and doorway sealing.
//!
//! Sealing closes a doorway that did not connect to a neighbour by
//! extending the wall tiles beside it across the gap:
//!
//! ```text
//!   north doorway, copy_start = W, width 3      east doorway, copy_start = W, height 2
//!
//!   W . . . W        W W W W W                  W          W
//!   w . . . w   ->   w w w w w                  .    ->    W
//!                                               .          W
//! ```
//!
//! North/south doorways copy the `copy_start` column eastward, east/west
//! doorways copy the `copy_start` row southward. The source strip is read
//! in full before anything is written, so a write never feeds a later read.

use serde::{Deserialize, Serialize};

use crate::geometry::GridPos;
use crate::template::{Doorway, Orientation};

/// Quarter-turn rotation applied to a tile sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

/// A single painted tile: sprite identity plus its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: u32,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub flip_x: bool,
}

impl Tile {
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            rotation: Rotation::R0,
            flip_x: false,
        }
    }

    pub const fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// The layers a room template paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Ground,
    Decoration1,
    Decoration2,
    Front,
    Collision,
    Minimap,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Ground,
        LayerKind::Decoration1,
        LayerKind::Decoration2,
        LayerKind::Front,
        LayerKind::Collision,
        LayerKind::Minimap,
    ];

    /// The collision layer only feeds physics and is never drawn.
    pub fn is_rendered(&self) -> bool {
        *self != LayerKind::Collision
    }
}

/// Read/write access to a grid of tiles.
///
/// Implemented by [`TileLayer`]; a renderer-owned tilemap can implement it
/// too so sealing writes straight into it.
pub trait TileGrid {
    fn tile(&self, pos: GridPos) -> Option<Tile>;

    /// Returns `false` when `pos` lies outside the grid and nothing was written.
    fn set_tile(&mut self, pos: GridPos, tile: Option<Tile>) -> bool;
}

/// Dense rectangular tile layer in template-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub kind: LayerKind,
    /// Tile coordinate of `tiles[0]` (lower-left)
    pub origin: GridPos,
    pub width: u32,
    pub height: u32,
    /// Row-major from the bottom row up; `None` is an empty cell
    pub tiles: Vec<Option<Tile>>,
}

impl TileLayer {
    /// An empty layer covering `width × height` tiles from `origin`.
    pub fn new(kind: LayerKind, origin: GridPos, width: u32, height: u32) -> Self {
        Self {
            kind,
            origin,
            width,
            height,
            tiles: vec![None; (width * height) as usize],
        }
    }

    /// Fill every cell with `tile`.
    pub fn filled(kind: LayerKind, origin: GridPos, width: u32, height: u32, tile: Tile) -> Self {
        let mut layer = Self::new(kind, origin, width, height);
        layer.tiles.iter_mut().for_each(|t| *t = Some(tile));
        layer
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        let local = pos - self.origin;
        if local.x < 0 || local.y < 0 || local.x >= self.width as i32 || local.y >= self.height as i32 {
            return None;
        }
        Some(local.y as usize * self.width as usize + local.x as usize)
    }

    /// Whether `tiles` holds exactly `width × height` cells. Deserialized
    /// layers are not checked until loaded through an asset.
    pub fn is_well_formed(&self) -> bool {
        self.tiles.len() == self.width as usize * self.height as usize
    }

    /// Number of painted cells.
    pub fn painted_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }
}

impl TileGrid for TileLayer {
    fn tile(&self, pos: GridPos) -> Option<Tile> {
        self.index(pos).and_then(|i| self.tiles.get(i).copied().flatten())
    }

    fn set_tile(&mut self, pos: GridPos, tile: Option<Tile>) -> bool {
        match self.index(pos).and_then(|i| self.tiles.get_mut(i)) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }
}

/// One destination cell of a seal and the source cell whose tile it receives.
fn seal_cells(doorway: &Doorway) -> Vec<(GridPos, GridPos)> {
    let start = doorway.copy_start;
    let w = doorway.copy_width as i32;
    let h = doorway.copy_height as i32;
    let mut cells = Vec::with_capacity((w * h).max(0) as usize);

    match doorway.orientation {
        Orientation::North | Orientation::South => {
            for x in 0..w {
                for y in 0..h {
                    let src = GridPos::new(start.x, start.y - y);
                    cells.push((GridPos::new(start.x + 1 + x, start.y - y), src));
                }
            }
        }
        Orientation::East | Orientation::West => {
            for y in 0..h {
                for x in 0..w {
                    let src = GridPos::new(start.x + x, start.y);
                    cells.push((GridPos::new(start.x + x, start.y - 1 - y), src));
                }
            }
        }
    }
    cells
}

/// Seal `doorway` on one grid. Returns the number of tiles written.
pub fn seal_doorway<G: TileGrid + ?Sized>(grid: &mut G, doorway: &Doorway) -> usize {
    let cells = seal_cells(doorway);
    // Snapshot every source before the first write.
    let sources: Vec<Option<Tile>> = cells.iter().map(|(_, src)| grid.tile(*src)).collect();

    cells
        .iter()
        .zip(sources)
        .filter(|((dst, _), tile)| grid.set_tile(*dst, *tile))
        .count()
}

/// Seal `doorway` on every layer. Returns the total number of tiles written.
pub fn seal_doorway_on_layers(layers: &mut [TileLayer], doorway: &Doorway) -> usize {
    layers.iter_mut().map(|layer| seal_doorway(layer, doorway)).sum()
}

/// Whether every cell a seal of `doorway` would write already carries its
/// source tile, i.e. no doorway-shaped gap remains.
pub fn is_sealed<G: TileGrid + ?Sized>(grid: &G, doorway: &Doorway) -> bool {
    seal_cells(doorway)
        .iter()
        .all(|(dst, src)| grid.tile(*dst) == grid.tile(*src))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALL: Tile = Tile::new(1);
    const WALL_TOP: Tile = Tile::new(2);
    const FLOOR: Tile = Tile::new(3);

    /// 10×6 room: floor inside, walls around, a 3-wide gap in the north wall
    /// at x = 4..=6 and a 2-tall gap in the east wall at y = 2..=3.
    fn room_layer() -> TileLayer {
        let mut layer = TileLayer::new(LayerKind::Ground, GridPos::ZERO, 10, 6);
        for y in 0..6 {
            for x in 0..10 {
                let edge = x == 0 || x == 9 || y == 0 || y == 5 || y == 4;
                let tile = if y == 5 {
                    WALL_TOP.rotated(Rotation::R180)
                } else if edge {
                    WALL
                } else {
                    FLOOR
                };
                layer.set_tile(GridPos::new(x, y), Some(tile));
            }
        }
        for x in 4..=6 {
            layer.set_tile(GridPos::new(x, 5), None);
            layer.set_tile(GridPos::new(x, 4), None);
        }
        for y in 2..=3 {
            layer.set_tile(GridPos::new(9, y), None);
        }
        layer
    }

    fn north_doorway() -> Doorway {
        Doorway::new(GridPos::new(5, 5), Orientation::North).with_seal(GridPos::new(3, 5), 3, 2)
    }

    fn east_doorway() -> Doorway {
        Doorway::new(GridPos::new(9, 3), Orientation::East).with_seal(GridPos::new(9, 4), 1, 2)
    }

    #[test]
    fn test_horizontal_seal_closes_gap() {
        let mut layer = room_layer();
        assert!(!is_sealed(&layer, &north_doorway()));

        let written = seal_doorway(&mut layer, &north_doorway());
        assert_eq!(written, 6);
        for x in 4..=6 {
            assert_eq!(layer.tile(GridPos::new(x, 5)), Some(WALL_TOP.rotated(Rotation::R180)));
            assert_eq!(layer.tile(GridPos::new(x, 4)), Some(WALL));
        }
        assert!(is_sealed(&layer, &north_doorway()));
    }

    #[test]
    fn test_seal_preserves_rotation() {
        let mut layer = room_layer();
        seal_doorway(&mut layer, &north_doorway());
        assert_eq!(layer.tile(GridPos::new(6, 5)).map(|t| t.rotation), Some(Rotation::R180));
    }

    #[test]
    fn test_vertical_seal_closes_gap() {
        let mut layer = room_layer();
        assert!(!is_sealed(&layer, &east_doorway()));
        seal_doorway(&mut layer, &east_doorway());
        assert_eq!(layer.tile(GridPos::new(9, 3)), Some(WALL));
        assert_eq!(layer.tile(GridPos::new(9, 2)), Some(WALL));
        // below the copied strip is untouched
        assert_eq!(layer.tile(GridPos::new(9, 1)), Some(WALL));
        assert!(is_sealed(&layer, &east_doorway()));
    }

    #[test]
    fn test_seal_reads_snapshot_not_own_writes() {
        // (1,2) starts out holding a different tile than the edge column;
        // every destination row must end up with its own edge tile.
        let mut layer = TileLayer::new(LayerKind::Front, GridPos::ZERO, 5, 3);
        layer.set_tile(GridPos::new(0, 2), Some(Tile::new(10)));
        layer.set_tile(GridPos::new(0, 1), Some(Tile::new(11)));
        layer.set_tile(GridPos::new(1, 2), Some(Tile::new(99)));
        let doorway =
            Doorway::new(GridPos::new(2, 2), Orientation::North).with_seal(GridPos::new(0, 2), 3, 2);

        seal_doorway(&mut layer, &doorway);
        for x in 1..=3 {
            assert_eq!(layer.tile(GridPos::new(x, 2)), Some(Tile::new(10)));
            assert_eq!(layer.tile(GridPos::new(x, 1)), Some(Tile::new(11)));
        }
    }

    #[test]
    fn test_out_of_bounds_writes_are_skipped() {
        let mut layer = TileLayer::filled(LayerKind::Collision, GridPos::ZERO, 3, 3, WALL);
        let doorway =
            Doorway::new(GridPos::new(2, 2), Orientation::South).with_seal(GridPos::new(1, 2), 4, 1);
        // only x = 2 is inside the layer
        assert_eq!(seal_doorway(&mut layer, &doorway), 1);
    }

    #[test]
    fn test_seal_all_layers() {
        let mut layers = vec![room_layer(), room_layer()];
        layers[1].kind = LayerKind::Minimap;
        let written = seal_doorway_on_layers(&mut layers, &north_doorway());
        assert_eq!(written, 12);
        assert!(layers.iter().all(|l| is_sealed(l, &north_doorway())));
    }

    #[test]
    fn test_layer_with_origin() {
        let mut layer = TileLayer::new(LayerKind::Ground, GridPos::new(-2, -2), 4, 4);
        assert!(layer.set_tile(GridPos::new(-2, -2), Some(FLOOR)));
        assert!(layer.set_tile(GridPos::new(1, 1), Some(FLOOR)));
        assert!(!layer.set_tile(GridPos::new(2, 1), Some(FLOOR)));
        assert_eq!(layer.painted_count(), 2);
        assert!(!LayerKind::Collision.is_rendered());
        assert!(LayerKind::Minimap.is_rendered());
    }

    #[test]
    fn test_short_tile_vec_reads_as_empty() {
        let mut layer = TileLayer {
            kind: LayerKind::Ground,
            origin: GridPos::ZERO,
            width: 4,
            height: 4,
            tiles: vec![Some(FLOOR); 2],
        };
        assert!(!layer.is_well_formed());
        assert_eq!(layer.tile(GridPos::new(1, 0)), Some(FLOOR));
        assert_eq!(layer.tile(GridPos::new(3, 3)), None);
        assert!(!layer.set_tile(GridPos::new(3, 3), Some(WALL)));
        assert!(layer.set_tile(GridPos::new(0, 0), Some(WALL)));
        assert_eq!(layer.tiles, vec![Some(WALL), Some(FLOOR)]);
        assert!(TileLayer::new(LayerKind::Front, GridPos::ZERO, 3, 2).is_well_formed());
    }
}
