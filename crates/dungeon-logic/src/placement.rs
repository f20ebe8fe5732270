//! Placed rooms: the layout engine's output.
//!
//! A [`PlacedRoom`] is a template stamped at a world tile offset for one
//! graph node. Doorway connection state lives here, never on the template.

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPos, TileRect, WorldPos};
use crate::graph::NodeId;
use crate::room_types::RoomNodeType;
use crate::spawn;
use crate::template::{Orientation, RoomTemplate, TemplateId};

/// A template doorway resolved into world tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDoorway {
    /// Index into the template's doorway list
    pub index: usize,
    pub orientation: Orientation,
    /// World tile of the doorway anchor
    pub position: GridPos,
    pub connected: bool,
    /// The room on the other side when connected
    pub connected_to: Option<NodeId>,
    pub door: Option<String>,
}

impl PlacedDoorway {
    /// The world tile directly outside this doorway, where a mating doorway sits.
    pub fn mate_position(&self) -> GridPos {
        self.position + self.orientation.outward()
    }

    /// Whether `other` is the doorway this one mates with: opposite
    /// orientation, anchors adjacent across the seam.
    pub fn mates_with(&self, other: &PlacedDoorway) -> bool {
        other.orientation == self.orientation.opposite() && other.position == self.mate_position()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRoom {
    pub node: NodeId,
    /// Node type after corridor resolution (`Corridor` becomes NS or EW)
    pub node_type: RoomNodeType,
    pub template: TemplateId,
    pub template_name: String,
    /// World tile rectangle, inclusive
    pub bounds: TileRect,
    /// The template's own lower bound, kept so local coordinates can be mapped
    pub template_lower_bounds: GridPos,
    pub doorways: Vec<PlacedDoorway>,
    /// Candidate spawn tiles in world coordinates
    pub spawn_positions: Vec<GridPos>,
    pub is_previously_visited: bool,
    pub is_lit: bool,
}

impl PlacedRoom {
    /// Stamp `template` so that its lower bound lands on world tile `lower`.
    pub fn new(
        node: NodeId,
        node_type: RoomNodeType,
        template_id: TemplateId,
        template: &RoomTemplate,
        lower: GridPos,
    ) -> Self {
        let offset = lower - template.lower_bounds;
        let doorways = template
            .doorways
            .iter()
            .enumerate()
            .map(|(index, d)| PlacedDoorway {
                index,
                orientation: d.orientation,
                position: d.position + offset,
                connected: false,
                connected_to: None,
                door: d.door.clone(),
            })
            .collect();

        Self {
            node,
            node_type,
            template: template_id,
            template_name: template.name.clone(),
            bounds: template.bounds().translated(offset),
            template_lower_bounds: template.lower_bounds,
            doorways,
            spawn_positions: template.spawn_positions.iter().map(|&p| p + offset).collect(),
            is_previously_visited: false,
            is_lit: false,
        }
    }

    pub fn doorway(&self, index: usize) -> Option<&PlacedDoorway> {
        self.doorways.get(index)
    }

    pub fn connected_doorways(&self) -> impl Iterator<Item = &PlacedDoorway> {
        self.doorways.iter().filter(|d| d.connected)
    }

    pub fn unconnected_doorways(&self) -> impl Iterator<Item = &PlacedDoorway> {
        self.doorways.iter().filter(|d| !d.connected)
    }

    /// The doorway leading to `node`, if one is connected to it.
    pub fn doorway_to(&self, node: NodeId) -> Option<&PlacedDoorway> {
        self.doorways.iter().find(|d| d.connected_to == Some(node))
    }

    pub fn world_center(&self, tile_size: f32) -> WorldPos {
        self.bounds.world_center(tile_size)
    }

    pub fn contains_world(&self, pos: WorldPos, tile_size: f32) -> bool {
        self.bounds.contains_world(pos, tile_size)
    }

    /// Spawn point nearest to `pos`, or `None` when the room has none.
    pub fn nearest_spawn_position(&self, pos: WorldPos, tile_size: f32) -> Option<WorldPos> {
        let candidates: Vec<WorldPos> = self
            .spawn_positions
            .iter()
            .map(|p| p.to_world(tile_size))
            .collect();
        spawn::nearest(&candidates, pos)
    }
}

/// World lower bound for a child template so that its doorway
/// `child_doorway` mates with `parent_doorway`.
///
/// The child's anchor tile ends up one tile outside the parent's anchor, so
/// the two rooms share the seam but no tile.
pub fn child_lower_bounds(
    parent_doorway: &PlacedDoorway,
    child: &RoomTemplate,
    child_doorway: usize,
) -> Option<GridPos> {
    let doorway = child.doorways.get(child_doorway)?;
    Some(parent_doorway.mate_position() - (doorway.position - child.lower_bounds))
}

/// A committed layout: one placed room per graph node, indexed by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRoomSet {
    pub graph_name: String,
    /// Seed of the attempt that produced this layout
    pub seed: u64,
    /// Attempts used, counting the successful one
    pub attempts: u32,
    rooms: Vec<PlacedRoom>,
}

impl PlacedRoomSet {
    /// `rooms` must be ordered so that `rooms[i].node == NodeId(i)`.
    pub fn new(graph_name: impl Into<String>, seed: u64, attempts: u32, rooms: Vec<PlacedRoom>) -> Self {
        debug_assert!(rooms.iter().enumerate().all(|(i, r)| r.node.index() == i));
        Self {
            graph_name: graph_name.into(),
            seed,
            attempts,
            rooms,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&PlacedRoom> {
        self.rooms.get(node.index())
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut PlacedRoom> {
        self.rooms.get_mut(node.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedRoom> {
        self.rooms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlacedRoom> {
        self.rooms.iter_mut()
    }

    pub fn rooms(&self) -> &[PlacedRoom] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn entrance(&self) -> Option<&PlacedRoom> {
        self.rooms.iter().find(|r| r.node_type.is_entrance())
    }

    /// The room whose world extent contains `pos`.
    pub fn room_at(&self, pos: WorldPos, tile_size: f32) -> Option<NodeId> {
        self.rooms
            .iter()
            .find(|r| r.contains_world(pos, tile_size))
            .map(|r| r.node)
    }

    /// Smallest rectangle containing every room.
    pub fn extent(&self) -> Option<TileRect> {
        let mut rooms = self.rooms.iter();
        let first = rooms.next()?.bounds;
        Some(rooms.fold(first, |acc, r| {
            TileRect::new(
                GridPos::new(acc.lower.x.min(r.bounds.lower.x), acc.lower.y.min(r.bounds.lower.y)),
                GridPos::new(acc.upper.x.max(r.bounds.upper.x), acc.upper.y.max(r.bounds.upper.y)),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Doorway;

    fn entrance() -> RoomTemplate {
        RoomTemplate::new("entrance", RoomNodeType::Entrance, GridPos::new(-4, -3), GridPos::new(4, 3))
            .with_doorway(Doorway::new(GridPos::new(4, 0), Orientation::East))
            .with_doorway(Doorway::new(GridPos::new(0, 3), Orientation::North))
            .with_spawn(GridPos::new(-2, -2))
            .with_spawn(GridPos::new(2, 2))
    }

    fn corridor() -> RoomTemplate {
        RoomTemplate::new("corridor_ew", RoomNodeType::CorridorEW, GridPos::ZERO, GridPos::new(5, 2))
            .with_doorway(Doorway::new(GridPos::new(0, 1), Orientation::West))
            .with_doorway(Doorway::new(GridPos::new(5, 1), Orientation::East))
    }

    #[test]
    fn test_stamp_translates_everything() {
        let room = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, TemplateId(0), &entrance(), GridPos::new(10, 10));
        assert_eq!(room.bounds, TileRect::new(GridPos::new(10, 10), GridPos::new(18, 16)));
        assert_eq!(room.bounds.lower - room.template_lower_bounds, GridPos::new(14, 13));
        assert_eq!(room.doorways[0].position, GridPos::new(18, 13));
        assert_eq!(room.spawn_positions, vec![GridPos::new(12, 11), GridPos::new(16, 15)]);
        assert!(room.doorways.iter().all(|d| !d.connected));
    }

    #[test]
    fn test_child_is_adjacent_not_overlapping() {
        let parent = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, TemplateId(0), &entrance(), GridPos::ZERO);
        let east = &parent.doorways[0];
        let lower = child_lower_bounds(east, &corridor(), 0).unwrap();
        let child = PlacedRoom::new(NodeId(1), RoomNodeType::CorridorEW, TemplateId(1), &corridor(), lower);

        assert!(east.mates_with(&child.doorways[0]));
        assert!(child.doorways[0].mates_with(east));
        assert!(!parent.bounds.overlaps(&child.bounds));
        assert_eq!(child.bounds.lower.x, parent.bounds.upper.x + 1);
    }

    #[test]
    fn test_child_lower_bounds_rejects_bad_index() {
        let parent = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, TemplateId(0), &entrance(), GridPos::ZERO);
        assert!(child_lower_bounds(&parent.doorways[0], &corridor(), 9).is_none());
    }

    #[test]
    fn test_nearest_spawn() {
        let room = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, TemplateId(0), &entrance(), GridPos::new(-4, -3));
        let near = room.nearest_spawn_position(WorldPos::new(3.0, 3.0), 1.0).unwrap();
        assert_eq!(near, WorldPos::new(2.0, 2.0));
    }

    #[test]
    fn test_set_lookup() {
        let a = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, TemplateId(0), &entrance(), GridPos::ZERO);
        let lower = child_lower_bounds(&a.doorways[0], &corridor(), 0).unwrap();
        let b = PlacedRoom::new(NodeId(1), RoomNodeType::CorridorEW, TemplateId(1), &corridor(), lower);
        let set = PlacedRoomSet::new("test", 7, 1, vec![a, b]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.entrance().map(|r| r.node), Some(NodeId(0)));
        assert_eq!(set.room_at(WorldPos::new(1.5, 1.5), 1.0), Some(NodeId(0)));
        assert_eq!(set.room_at(WorldPos::new(10.5, 3.5), 1.0), Some(NodeId(1)));
        assert_eq!(set.room_at(WorldPos::new(100.0, 0.0), 1.0), None);
        let extent = set.extent().unwrap();
        assert_eq!(extent.lower, GridPos::ZERO);
        assert_eq!(extent.upper.x, 14);
    }
}
