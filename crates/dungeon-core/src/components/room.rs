//! Room entity components.

use dungeon_logic::graph::NodeId;
use dungeon_logic::lighting::Fade;
use dungeon_logic::tilemap::TileLayer;

/// Links a room entity to its node and placed room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomId(pub NodeId);

/// The room's tile layers in template-local coordinates, sealed by stitching.
#[derive(Debug, Clone, Default)]
pub struct RoomTiles {
    pub layers: Vec<TileLayer>,
}

/// Active fade-in on a room. `None` when the room is dark or fully lit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomLighting {
    pub fade: Option<Fade>,
}
