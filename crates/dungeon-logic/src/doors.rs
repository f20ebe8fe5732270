//! Door placement rules for connected doorways.

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPos, WorldPos};
use crate::graph::NodeId;
use crate::placement::PlacedRoom;
use crate::settings::DungeonSettings;
use crate::template::Orientation;

/// Where and how to instantiate one door object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub room: NodeId,
    /// Index of the doorway in the room's doorway list
    pub doorway: usize,
    /// Door object reference copied from the template doorway
    pub object: String,
    pub orientation: Orientation,
    pub position: WorldPos,
    /// Boss room doors start locked
    pub locked: bool,
}

/// World anchor of a door on a doorway tile.
pub fn door_position(doorway_tile: GridPos, orientation: Orientation, settings: &DungeonSettings) -> WorldPos {
    let offset = settings.door_offset(orientation);
    WorldPos::new(
        (doorway_tile.x as f32 + offset.x) * settings.tile_size,
        (doorway_tile.y as f32 + offset.y) * settings.tile_size,
    )
}

/// Doors to instantiate for `room`: one per connected doorway that names a
/// door object. Corridors never get doors.
pub fn door_specs_for_room(room: &PlacedRoom, settings: &DungeonSettings) -> Vec<DoorSpec> {
    if room.node_type.is_corridor() {
        return Vec::new();
    }
    room.connected_doorways()
        .filter_map(|d| {
            let object = d.door.clone()?;
            Some(DoorSpec {
                room: room.node,
                doorway: d.index,
                object,
                orientation: d.orientation,
                position: door_position(d.position, d.orientation, settings),
                locked: room.node_type.is_boss_room(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room_types::RoomNodeType;
    use crate::template::{Doorway, RoomTemplate, TemplateId};

    fn room(node_type: RoomNodeType) -> PlacedRoom {
        let t = RoomTemplate::new("r", node_type, GridPos::ZERO, GridPos::new(7, 7))
            .with_doorway(Doorway::new(GridPos::new(3, 7), Orientation::North).with_door("door_ns"))
            .with_doorway(Doorway::new(GridPos::new(0, 3), Orientation::West).with_door("door_ew"))
            .with_doorway(Doorway::new(GridPos::new(7, 3), Orientation::East));
        let mut r = PlacedRoom::new(NodeId(2), node_type, TemplateId(0), &t, GridPos::ZERO);
        for d in &mut r.doorways {
            d.connected = true;
        }
        r
    }

    #[test]
    fn test_positions_follow_orientation() {
        let s = DungeonSettings::default();
        let tile = GridPos::new(4, 2);
        assert_eq!(door_position(tile, Orientation::North, &s), WorldPos::new(4.5, 3.0));
        assert_eq!(door_position(tile, Orientation::South, &s), WorldPos::new(4.5, 2.0));
        assert_eq!(door_position(tile, Orientation::East, &s), WorldPos::new(5.0, 3.25));
        assert_eq!(door_position(tile, Orientation::West, &s), WorldPos::new(4.0, 3.25));
    }

    #[test]
    fn test_tile_size_scales_position() {
        let s = DungeonSettings {
            tile_size: 2.0,
            ..Default::default()
        };
        assert_eq!(door_position(GridPos::new(1, 1), Orientation::North, &s), WorldPos::new(3.0, 4.0));
    }

    #[test]
    fn test_only_doorways_with_door_objects() {
        let specs = door_specs_for_room(&room(RoomNodeType::MediumRoom), &DungeonSettings::default());
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| !s.locked));
        assert_eq!(specs[0].object, "door_ns");
    }

    #[test]
    fn test_unconnected_doorway_gets_no_door() {
        let mut r = room(RoomNodeType::SmallRoom);
        r.doorways[0].connected = false;
        let specs = door_specs_for_room(&r, &DungeonSettings::default());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].orientation, Orientation::West);
    }

    #[test]
    fn test_boss_doors_are_locked() {
        let specs = door_specs_for_room(&room(RoomNodeType::BossRoom), &DungeonSettings::default());
        assert!(!specs.is_empty());
        assert!(specs.iter().all(|s| s.locked));
    }

    #[test]
    fn test_corridors_get_no_doors() {
        assert!(door_specs_for_room(&room(RoomNodeType::CorridorNS), &DungeonSettings::default()).is_empty());
    }
}
