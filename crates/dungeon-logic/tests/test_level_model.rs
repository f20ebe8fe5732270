//! Integration tests for the level model.
//!
//! Exercises: RoomNodeGraph authoring → DungeonLevel validation →
//! hand-placed rooms → layout validation → sealing → door specs
//!
//! Everything is pure data: rooms are placed by hand here, the search
//! lives in dungeon-core.

use dungeon_logic::doors::door_specs_for_room;
use dungeon_logic::geometry::{GridPos, WorldPos};
use dungeon_logic::graph::{ConnectionError, GraphError, NodeId, RoomNodeGraph};
use dungeon_logic::level::{validate_level, DungeonLevel, LevelError};
use dungeon_logic::placement::{child_lower_bounds, PlacedRoom, PlacedRoomSet};
use dungeon_logic::room_types::RoomNodeType;
use dungeon_logic::settings::DungeonSettings;
use dungeon_logic::template::{Doorway, Orientation, RoomTemplate, RoomTemplateLibrary, TemplateId};
use dungeon_logic::tilemap::{is_sealed, seal_doorway_on_layers, LayerKind, Tile, TileLayer};
use dungeon_logic::validate::{validate_layout, Severity};

// ── Helpers ────────────────────────────────────────────────────────────

fn library() -> RoomTemplateLibrary {
    [
        RoomTemplate::new("gate", RoomNodeType::Entrance, GridPos::ZERO, GridPos::new(6, 6))
            .with_doorway(
                Doorway::new(GridPos::new(6, 3), Orientation::East)
                    .with_door("door_ew")
                    .with_seal(GridPos::new(6, 4), 1, 1),
            )
            .with_doorway(
                Doorway::new(GridPos::new(3, 6), Orientation::North)
                    .with_door("door_ns")
                    .with_seal(GridPos::new(2, 6), 1, 1),
            )
            .with_spawn(GridPos::new(3, 3)),
        RoomTemplate::new("tunnel", RoomNodeType::CorridorEW, GridPos::ZERO, GridPos::new(4, 2))
            .with_doorway(Doorway::new(GridPos::new(0, 1), Orientation::West))
            .with_doorway(Doorway::new(GridPos::new(4, 1), Orientation::East)),
        RoomTemplate::new("shaft", RoomNodeType::CorridorNS, GridPos::ZERO, GridPos::new(2, 4))
            .with_doorway(Doorway::new(GridPos::new(1, 0), Orientation::South))
            .with_doorway(Doorway::new(GridPos::new(1, 4), Orientation::North)),
        RoomTemplate::new("throne", RoomNodeType::BossRoom, GridPos::ZERO, GridPos::new(8, 8))
            .with_doorway(Doorway::new(GridPos::new(0, 4), Orientation::West).with_door("boss_door")),
    ]
    .into_iter()
    .collect()
}

fn graph() -> RoomNodeGraph {
    let mut g = RoomNodeGraph::new("gate to throne");
    let e = g.add_node(RoomNodeType::Entrance);
    let c = g.add_node(RoomNodeType::Corridor);
    let b = g.add_node(RoomNodeType::BossRoom);
    g.connect(e, c).unwrap();
    g.connect(c, b).unwrap();
    g
}

/// Place gate → tunnel → throne by hand, the way the engine would.
fn placed(lib: &RoomTemplateLibrary) -> PlacedRoomSet {
    let gate_id = lib.find_by_name("gate").unwrap();
    let tunnel_id = lib.find_by_name("tunnel").unwrap();
    let throne_id = lib.find_by_name("throne").unwrap();
    let (gate_t, tunnel_t, throne_t) = (
        lib.get(gate_id).unwrap(),
        lib.get(tunnel_id).unwrap(),
        lib.get(throne_id).unwrap(),
    );

    let mut gate = PlacedRoom::new(NodeId(0), RoomNodeType::Entrance, gate_id, gate_t, GridPos::ZERO);
    let tunnel_lower = child_lower_bounds(&gate.doorways[0], tunnel_t, 0).unwrap();
    let mut tunnel = PlacedRoom::new(NodeId(1), RoomNodeType::CorridorEW, tunnel_id, tunnel_t, tunnel_lower);
    let throne_lower = child_lower_bounds(&tunnel.doorways[1], throne_t, 0).unwrap();
    let mut throne = PlacedRoom::new(NodeId(2), RoomNodeType::BossRoom, throne_id, throne_t, throne_lower);

    link(&mut gate, 0, &mut tunnel, 0);
    link(&mut tunnel, 1, &mut throne, 0);
    PlacedRoomSet::new("gate to throne", 0, 1, vec![gate, tunnel, throne])
}

fn link(a: &mut PlacedRoom, ai: usize, b: &mut PlacedRoom, bi: usize) {
    a.doorways[ai].connected = true;
    a.doorways[ai].connected_to = Some(b.node);
    b.doorways[bi].connected = true;
    b.doorways[bi].connected_to = Some(a.node);
}

// ── Graph authoring ────────────────────────────────────────────────────

#[test]
fn test_authoring_rules_hold_through_connect() {
    let mut g = graph();
    let boss = NodeId(2);
    let c = g.add_node(RoomNodeType::Corridor);
    let extra_boss = g.add_node(RoomNodeType::BossRoom);
    g.connect(boss, c).unwrap();
    assert_eq!(g.connect(c, extra_boss), Err(ConnectionError::SecondBossRoom));

    // dangling boss room: a room with no corridor in
    assert!(matches!(g.validate(), Err(GraphError::Unreachable(_)) | Err(GraphError::CorridorArity { .. })));
}

#[test]
fn test_graph_survives_json() {
    let g = graph();
    let json = serde_json::to_string(&g).unwrap();
    let back: RoomNodeGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(back.edges().collect::<Vec<_>>(), g.edges().collect::<Vec<_>>());
    assert_eq!(back.placement_order().unwrap(), vec![NodeId(0), NodeId(1), NodeId(2)]);
}

// ── Level validation ───────────────────────────────────────────────────

#[test]
fn test_level_with_every_template_is_clean() {
    let level = DungeonLevel {
        name: "Keep".into(),
        templates: library(),
        graphs: vec![graph()],
    };
    let errors: Vec<_> = validate_level(&level)
        .into_iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(level.check().is_ok());
}

#[test]
fn test_level_missing_boss_template() {
    let templates: RoomTemplateLibrary = library()
        .iter()
        .filter(|(_, t)| t.node_type != RoomNodeType::BossRoom)
        .map(|(_, t)| t.clone())
        .collect();
    let level = DungeonLevel {
        name: "Keep".into(),
        templates,
        graphs: vec![graph()],
    };
    let Err(LevelError::Invalid { issues, .. }) = level.check() else {
        panic!("level without a boss template passed");
    };
    assert!(issues.iter().any(|i| i.message.contains("Boss Room")), "{:?}", issues);
}

// ── Placement and validation ───────────────────────────────────────────

#[test]
fn test_hand_placed_layout_is_valid() {
    let lib = library();
    let set = placed(&lib);
    assert!(validate_layout(&set, &graph()).is_empty());

    let tunnel = set.get(NodeId(1)).unwrap();
    assert_eq!(tunnel.bounds.lower, GridPos::new(7, 2));
    let throne = set.get(NodeId(2)).unwrap();
    assert_eq!(throne.bounds.lower, GridPos::new(12, -1));
    assert_eq!(set.extent().unwrap().upper, GridPos::new(20, 7));
}

#[test]
fn test_unmated_edge_is_reported() {
    let lib = library();
    let mut set = placed(&lib);
    let throne = set.get_mut(NodeId(2)).unwrap();
    throne.doorways[0].connected = false;
    throne.doorways[0].connected_to = None;

    let errors = validate_layout(&set, &graph());
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.severity == Severity::Error));
}

#[test]
fn test_room_lookup_by_world_position() {
    let set = placed(&library());
    let tile = DungeonSettings::default().tile_size;
    assert_eq!(set.room_at(WorldPos::new(3.5, 3.5), tile), Some(NodeId(0)));
    assert_eq!(set.room_at(WorldPos::new(9.0, 3.5), tile), Some(NodeId(1)));
    assert_eq!(set.room_at(WorldPos::new(16.0, 3.0), tile), Some(NodeId(2)));
    assert_eq!(set.room_at(WorldPos::new(-1.0, 3.0), tile), None);
}

// ── Sealing and doors ──────────────────────────────────────────────────

#[test]
fn test_unused_entrance_doorway_seals() {
    let lib = library();
    let set = placed(&lib);
    let gate = set.entrance().unwrap();
    let template = lib.get(gate.template).unwrap();

    let mut layers: Vec<TileLayer> = [LayerKind::Ground, LayerKind::Front]
        .into_iter()
        .map(|kind| TileLayer::filled(kind, GridPos::ZERO, 7, 7, Tile::new(5)))
        .collect();
    for layer in &mut layers {
        layer.tiles[6 * 7 + 3] = None;
    }

    let unused: Vec<_> = gate.unconnected_doorways().map(|d| d.index).collect();
    assert_eq!(unused, vec![1]);
    let doorway = &template.doorways[1];
    assert!(!is_sealed(&layers[0], doorway));
    assert_eq!(seal_doorway_on_layers(&mut layers, doorway), 2);
    assert!(layers.iter().all(|l| is_sealed(l, doorway)));
    assert!(layers.iter().all(|l| l.painted_count() == 49));
}

#[test]
fn test_door_specs_follow_connections() {
    let set = placed(&library());
    let settings = DungeonSettings::default();

    let gate = door_specs_for_room(set.get(NodeId(0)).unwrap(), &settings);
    assert_eq!(gate.len(), 1);
    assert_eq!(gate[0].object, "door_ew");
    assert!(!gate[0].locked);
    assert_eq!(gate[0].position, WorldPos::new(7.0, 4.25));

    assert!(door_specs_for_room(set.get(NodeId(1)).unwrap(), &settings).is_empty());

    let throne = door_specs_for_room(set.get(NodeId(2)).unwrap(), &settings);
    assert_eq!(throne.len(), 1);
    assert!(throne[0].locked);
    assert_eq!(throne[0].orientation, Orientation::West);
    assert_eq!(throne[0].room, NodeId(2));
    assert_eq!(set.get(NodeId(2)).unwrap().template, TemplateId(3));
}
