//! Runtime settings shared by stitching and the dungeon session.

use serde::{Deserialize, Serialize};

use crate::geometry::WorldPos;
use crate::template::Orientation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonSettings {
    /// World units per tile
    pub tile_size: f32,
    /// Seconds for a room to fade in on first entry
    pub fade_in_time: f32,
    pub fade_start_alpha: f32,
    /// Door anchor offsets from the doorway tile, in tiles
    pub door_offset_north: WorldPos,
    pub door_offset_south: WorldPos,
    pub door_offset_east: WorldPos,
    pub door_offset_west: WorldPos,
}

impl Default for DungeonSettings {
    fn default() -> Self {
        Self {
            tile_size: 1.0,
            fade_in_time: 0.5,
            fade_start_alpha: 0.05,
            door_offset_north: WorldPos::new(0.5, 1.0),
            door_offset_south: WorldPos::new(0.5, 0.0),
            door_offset_east: WorldPos::new(1.0, 1.25),
            door_offset_west: WorldPos::new(0.0, 1.25),
        }
    }
}

impl DungeonSettings {
    pub fn door_offset(&self, orientation: Orientation) -> WorldPos {
        match orientation {
            Orientation::North => self.door_offset_north,
            Orientation::South => self.door_offset_south,
            Orientation::East => self.door_offset_east,
            Orientation::West => self.door_offset_west,
        }
    }
}
