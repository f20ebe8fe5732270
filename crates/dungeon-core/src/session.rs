//! Dungeon session - runtime state of one generated level.
//!
//! The session owns the committed layout, an ECS world holding room and door
//! entities, the current/previous room and the room-changed observers.
//! Several sessions can live side by side; nothing here is global.

use hecs::{Entity, World};

use dungeon_logic::doors::DoorSpec;
use dungeon_logic::geometry::WorldPos;
use dungeon_logic::graph::NodeId;
use dungeon_logic::lighting::Fade;
use dungeon_logic::placement::{PlacedRoom, PlacedRoomSet};
use dungeon_logic::settings::DungeonSettings;
use dungeon_logic::template::RoomTemplateLibrary;

use crate::components::*;
use crate::events::{ObserverId, RoomChanged, RoomObservers};
use crate::stitching::{self, StitchError, StitchReport};

pub struct DungeonSession {
    /// ECS world containing room and door entities
    pub world: World,
    layout: PlacedRoomSet,
    settings: DungeonSettings,
    /// Room entity per node index
    rooms: Vec<Entity>,
    current_room: Option<NodeId>,
    previous_room: Option<NodeId>,
    observers: RoomObservers,
    stitch_report: StitchReport,
}

impl DungeonSession {
    /// Spawn the layout's rooms, stitch them, and start in the entrance.
    pub fn new(
        layout: PlacedRoomSet,
        templates: &RoomTemplateLibrary,
        settings: DungeonSettings,
    ) -> Result<Self, StitchError> {
        let mut world = World::new();
        let mut rooms = Vec::with_capacity(layout.len());
        for room in layout.iter() {
            let template = templates.get(room.template).ok_or(StitchError::UnknownTemplate {
                room: room.node,
                template: room.template,
            })?;
            rooms.push(world.spawn((
                RoomId(room.node),
                RoomTiles {
                    layers: template.layers.clone(),
                },
                RoomLighting::default(),
            )));
        }

        let stitch_report = stitching::stitch(&mut world, &rooms, &layout, templates, &settings)?;

        let mut session = Self {
            world,
            layout,
            settings,
            rooms,
            current_room: None,
            previous_room: None,
            observers: RoomObservers::new(),
            stitch_report,
        };
        if let Some(entrance) = session.layout.entrance().map(|r| r.node) {
            session.enter(entrance);
        }
        Ok(session)
    }

    pub fn layout(&self) -> &PlacedRoomSet {
        &self.layout
    }

    pub fn settings(&self) -> &DungeonSettings {
        &self.settings
    }

    pub fn stitch_report(&self) -> StitchReport {
        self.stitch_report
    }

    pub fn current_room(&self) -> Option<NodeId> {
        self.current_room
    }

    pub fn previous_room(&self) -> Option<NodeId> {
        self.previous_room
    }

    pub fn room(&self, node: NodeId) -> Option<&PlacedRoom> {
        self.layout.get(node)
    }

    pub fn room_entity(&self, node: NodeId) -> Option<Entity> {
        self.rooms.get(node.index()).copied()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&RoomChanged) + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Spawn point of the entrance nearest its centre, or the centre itself
    /// when the entrance has no spawn points.
    pub fn player_start_position(&self) -> WorldPos {
        let tile_size = self.settings.tile_size;
        let Some(entrance) = self.layout.entrance() else {
            return WorldPos::ZERO;
        };
        let centre = entrance.world_center(tile_size);
        entrance.nearest_spawn_position(centre, tile_size).unwrap_or(centre)
    }

    /// Called every tick with the player's position. Fires a room-changed
    /// notification only when the position lies in a room other than the
    /// current one; positions outside every room keep the current room.
    pub fn update_player_position(&mut self, pos: WorldPos) -> Option<RoomChanged> {
        let node = self.layout.room_at(pos, self.settings.tile_size)?;
        if self.current_room == Some(node) {
            return None;
        }
        let event = self.enter(node);
        log::debug!(
            "Player entered room {} ({}) from {:?}",
            node,
            self.layout.get(node).map_or("?", |r| r.template_name.as_str()),
            event.previous
        );
        self.observers.notify(&event);
        Some(event)
    }

    fn enter(&mut self, node: NodeId) -> RoomChanged {
        let mut first_visit = false;
        if let Some(room) = self.layout.get_mut(node) {
            first_visit = !room.is_previously_visited;
            room.is_previously_visited = true;
        }
        self.previous_room = self.current_room;
        self.current_room = Some(node);
        self.light_room(node);
        RoomChanged {
            entered: node,
            previous: self.previous_room,
            first_visit,
        }
    }

    /// Mark `node` lit and start fades on it and its unlit doors.
    fn light_room(&mut self, node: NodeId) {
        let Some(room) = self.layout.get_mut(node) else { return };
        if room.is_lit {
            return;
        }
        room.is_lit = true;

        let fade = Fade::start(self.settings.fade_in_time, self.settings.fade_start_alpha);
        if let Some(&entity) = self.rooms.get(node.index()) {
            if let Ok(mut lighting) = self.world.get::<&mut RoomLighting>(entity) {
                lighting.fade = Some(fade);
            }
        }
        for (_, (spec, lighting)) in self.world.query_mut::<(&DoorSpec, &mut DoorLighting)>() {
            if spec.room == node && !lighting.is_lit {
                lighting.is_lit = true;
                lighting.fade = Some(fade);
            }
        }
    }

    /// Advance every active fade by `dt` seconds, dropping finished ones.
    pub fn tick(&mut self, dt: f32) {
        for (_, lighting) in self.world.query_mut::<&mut RoomLighting>() {
            lighting.fade = advance(lighting.fade, dt);
        }
        for (_, lighting) in self.world.query_mut::<&mut DoorLighting>() {
            lighting.fade = advance(lighting.fade, dt);
        }
    }

    /// Current opacity of a room: 0 while dark, the fade while fading, then 1.
    pub fn room_alpha(&self, node: NodeId) -> f32 {
        let lit = self.layout.get(node).map_or(false, |r| r.is_lit);
        if !lit {
            return 0.0;
        }
        self.room_entity(node)
            .and_then(|e| self.world.get::<&RoomLighting>(e).ok().and_then(|l| l.fade))
            .map_or(1.0, |f| f.alpha())
    }

    /// Whether any room or door is still fading in.
    pub fn is_fading(&self) -> bool {
        self.world.query::<&RoomLighting>().iter().any(|(_, l)| l.fade.is_some())
            || self.world.query::<&DoorLighting>().iter().any(|(_, l)| l.fade.is_some())
    }

    // ── Doors ──

    /// Door entities belonging to `node`.
    pub fn doors_of(&self, node: NodeId) -> Vec<Entity> {
        self.world
            .query::<&DoorSpec>()
            .iter()
            .filter(|(_, spec)| spec.room == node)
            .map(|(e, _)| e)
            .collect()
    }

    pub fn door(&self, entity: Entity) -> Option<Door> {
        self.world.get::<&Door>(entity).ok().map(|d| *d)
    }

    /// Try to open a door. Locked doors stay shut.
    pub fn open_door(&mut self, entity: Entity) -> bool {
        match self.world.get::<&mut Door>(entity) {
            Ok(mut door) => door.open(),
            Err(_) => false,
        }
    }

    /// Lock every door of `node`. Returns how many doors were affected.
    pub fn lock_room_doors(&mut self, node: NodeId) -> usize {
        self.for_room_doors(node, Door::lock)
    }

    /// Unlock every door of `node`. Returns how many doors were affected.
    pub fn unlock_room_doors(&mut self, node: NodeId) -> usize {
        self.for_room_doors(node, Door::unlock)
    }

    fn for_room_doors(&mut self, node: NodeId, mut f: impl FnMut(&mut Door)) -> usize {
        let mut count = 0;
        for (_, (spec, door)) in self.world.query_mut::<(&DoorSpec, &mut Door)>() {
            if spec.room == node {
                f(door);
                count += 1;
            }
        }
        count
    }
}

fn advance(fade: Option<Fade>, dt: f32) -> Option<Fade> {
    let mut fade = fade?;
    fade.advance(dt);
    if fade.is_finished() {
        None
    } else {
        Some(fade)
    }
}

impl std::fmt::Debug for DungeonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DungeonSession")
            .field("graph", &self.layout.graph_name)
            .field("rooms", &self.rooms.len())
            .field("current_room", &self.current_room)
            .field("previous_room", &self.previous_room)
            .field("observers", &self.observers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_layout, LayoutConfig, SelectionPolicy};
    use dungeon_logic::geometry::GridPos;
    use dungeon_logic::graph::RoomNodeGraph;
    use dungeon_logic::room_types::RoomNodeType;
    use dungeon_logic::template::{Doorway, Orientation, RoomTemplate};

    /// entrance (0,0)-(6,6) -> corridor (7,2)-(11,4) -> room (12,0)-(18,6)
    fn session() -> DungeonSession {
        let templates: RoomTemplateLibrary = [
            RoomTemplate::new("hall", RoomNodeType::Entrance, GridPos::ZERO, GridPos::new(6, 6))
                .with_doorway(Doorway::new(GridPos::new(6, 3), Orientation::East).with_door("door_ew"))
                .with_spawn(GridPos::new(1, 1))
                .with_spawn(GridPos::new(3, 2)),
            RoomTemplate::new("passage", RoomNodeType::CorridorEW, GridPos::ZERO, GridPos::new(4, 2))
                .with_doorway(Doorway::new(GridPos::new(0, 1), Orientation::West).with_door("door_ew"))
                .with_doorway(Doorway::new(GridPos::new(4, 1), Orientation::East).with_door("door_ew")),
            RoomTemplate::new("den", RoomNodeType::SmallRoom, GridPos::ZERO, GridPos::new(6, 6))
                .with_doorway(Doorway::new(GridPos::new(0, 3), Orientation::West).with_door("door_ew")),
        ]
        .into_iter()
        .collect();

        let mut g = RoomNodeGraph::new("three");
        let e = g.add_node(RoomNodeType::Entrance);
        let c = g.add_node(RoomNodeType::Corridor);
        let r = g.add_node(RoomNodeType::SmallRoom);
        g.connect(e, c).unwrap();
        g.connect(c, r).unwrap();

        let config = LayoutConfig::default().with_selection(SelectionPolicy::FirstFit);
        let layout = generate_layout(&g, &templates, &config).unwrap();
        DungeonSession::new(layout, &templates, DungeonSettings::default()).unwrap()
    }

    #[test]
    fn test_starts_in_entrance() {
        let s = session();
        assert_eq!(s.current_room(), Some(NodeId(0)));
        assert_eq!(s.previous_room(), None);
        assert!(s.room(NodeId(0)).unwrap().is_previously_visited);
        assert!(s.room(NodeId(0)).unwrap().is_lit);
        assert!(!s.room(NodeId(2)).unwrap().is_lit);
    }

    #[test]
    fn test_player_start_is_spawn_nearest_centre() {
        // centre of a 7x7 room at the origin is (3.5, 3.5); spawn (3,2) is closest
        assert_eq!(session().player_start_position(), WorldPos::new(3.0, 2.0));
    }

    #[test]
    fn test_corridors_get_no_doors() {
        let s = session();
        assert_eq!(s.doors_of(NodeId(0)).len(), 1);
        assert!(s.doors_of(NodeId(1)).is_empty());
        assert_eq!(s.doors_of(NodeId(2)).len(), 1);
        assert_eq!(s.stitch_report().doors, 2);
    }

    #[test]
    fn test_fade_runs_to_completion() {
        let mut s = session();
        s.update_player_position(WorldPos::new(15.0, 3.0));
        let start = s.room_alpha(NodeId(2));
        assert!((start - 0.05).abs() < 1e-5);
        assert!(s.is_fading());
        s.tick(0.25);
        assert!(s.room_alpha(NodeId(2)) > start);
        s.tick(0.5);
        assert_eq!(s.room_alpha(NodeId(2)), 1.0);
        assert!(!s.is_fading());
        assert_eq!(s.room_alpha(NodeId(1)), 0.0);
    }

    #[test]
    fn test_outside_all_rooms_keeps_current() {
        let mut s = session();
        assert!(s.update_player_position(WorldPos::new(-50.0, -50.0)).is_none());
        assert_eq!(s.current_room(), Some(NodeId(0)));
    }

    #[test]
    fn test_door_locking() {
        let mut s = session();
        let door = s.doors_of(NodeId(2))[0];
        assert!(s.open_door(door));
        assert_eq!(s.lock_room_doors(NodeId(2)), 1);
        assert!(!s.open_door(door));
        assert_eq!(s.unlock_room_doors(NodeId(2)), 1);
        assert!(s.door(door).unwrap().open);
    }
}
