//! Doorway stitching: seal the doorways a layout left unused and
//! instantiate doors on the ones it connected.

use hecs::{Entity, World};

use dungeon_logic::doors::door_specs_for_room;
use dungeon_logic::graph::NodeId;
use dungeon_logic::placement::{PlacedRoom, PlacedRoomSet};
use dungeon_logic::settings::DungeonSettings;
use dungeon_logic::template::{RoomTemplate, RoomTemplateLibrary, TemplateId};
use dungeon_logic::tilemap::{seal_doorway_on_layers, TileLayer};

use crate::components::{Door, DoorLighting, RoomTiles};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StitchError {
    /// The layout references a template the library does not have
    UnknownTemplate { room: NodeId, template: TemplateId },
    /// No room entity was spawned for a placed room
    MissingRoomEntity(NodeId),
}

impl std::fmt::Display for StitchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StitchError::UnknownTemplate { room, template } => {
                write!(f, "room {} uses unknown template #{}", room, template.0)
            }
            StitchError::MissingRoomEntity(room) => write!(f, "room {} has no entity", room),
        }
    }
}

impl std::error::Error for StitchError {}

/// Totals from one stitching pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StitchReport {
    pub sealed_doorways: usize,
    pub tiles_written: usize,
    pub doors: usize,
    pub locked_doors: usize,
}

/// Seal every unconnected doorway of `room` on `layers` (template-local).
/// Returns the number of tiles written.
pub fn seal_room(room: &PlacedRoom, template: &RoomTemplate, layers: &mut [TileLayer]) -> usize {
    room.unconnected_doorways()
        .filter_map(|d| template.doorways.get(d.index))
        .map(|doorway| seal_doorway_on_layers(layers, doorway))
        .sum()
}

/// Stitch a committed layout into `world`.
///
/// `rooms[i]` is the entity of node `i`; its [`RoomTiles`] are sealed in
/// place. One door entity is spawned per door spec, locked for boss rooms.
pub fn stitch(
    world: &mut World,
    rooms: &[Entity],
    layout: &PlacedRoomSet,
    templates: &RoomTemplateLibrary,
    settings: &DungeonSettings,
) -> Result<StitchReport, StitchError> {
    let mut report = StitchReport::default();

    for room in layout.iter() {
        let template = templates.get(room.template).ok_or(StitchError::UnknownTemplate {
            room: room.node,
            template: room.template,
        })?;
        let entity = *rooms
            .get(room.node.index())
            .ok_or(StitchError::MissingRoomEntity(room.node))?;

        if let Ok(mut tiles) = world.get::<&mut RoomTiles>(entity) {
            report.tiles_written += seal_room(room, template, &mut tiles.layers);
        }
        report.sealed_doorways += room.unconnected_doorways().count();

        for spec in door_specs_for_room(room, settings) {
            report.doors += 1;
            if spec.locked {
                report.locked_doors += 1;
            }
            world.spawn((Door::new(spec.locked), DoorLighting::default(), spec));
        }
    }

    log::debug!(
        "Stitched '{}': {} doorways sealed ({} tiles), {} doors ({} locked)",
        layout.graph_name,
        report.sealed_doorways,
        report.tiles_written,
        report.doors,
        report.locked_doors
    );
    Ok(report)
}
