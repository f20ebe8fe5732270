//! Room node types: the fixed vocabulary of roles a room can play in a level.
//!
//! Facets overlap on purpose: a `CorridorNS` is both `is_corridor()` and
//! `is_corridor_ns()`.

use serde::{Deserialize, Serialize};

/// Role of a room node in the level topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomNodeType {
    /// Placeholder for a node that has not been given a role yet
    None,
    Entrance,
    /// Generic corridor, resolved to NS or EW during placement
    Corridor,
    #[serde(rename = "corridor_ns")]
    CorridorNS,
    #[serde(rename = "corridor_ew")]
    CorridorEW,
    SmallRoom,
    MediumRoom,
    LargeRoom,
    ChestRoom,
    BossRoom,
}

impl RoomNodeType {
    pub const ALL: [RoomNodeType; 10] = [
        RoomNodeType::None,
        RoomNodeType::Entrance,
        RoomNodeType::Corridor,
        RoomNodeType::CorridorNS,
        RoomNodeType::CorridorEW,
        RoomNodeType::SmallRoom,
        RoomNodeType::MediumRoom,
        RoomNodeType::LargeRoom,
        RoomNodeType::ChestRoom,
        RoomNodeType::BossRoom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RoomNodeType::None => "None",
            RoomNodeType::Entrance => "Entrance",
            RoomNodeType::Corridor => "Corridor",
            RoomNodeType::CorridorNS => "Corridor N/S",
            RoomNodeType::CorridorEW => "Corridor E/W",
            RoomNodeType::SmallRoom => "Small Room",
            RoomNodeType::MediumRoom => "Medium Room",
            RoomNodeType::LargeRoom => "Large Room",
            RoomNodeType::ChestRoom => "Chest Room",
            RoomNodeType::BossRoom => "Boss Room",
        }
    }

    pub fn is_entrance(&self) -> bool {
        *self == RoomNodeType::Entrance
    }

    pub fn is_corridor_ns(&self) -> bool {
        *self == RoomNodeType::CorridorNS
    }

    pub fn is_corridor_ew(&self) -> bool {
        *self == RoomNodeType::CorridorEW
    }

    /// Any corridor, generic or oriented.
    pub fn is_corridor(&self) -> bool {
        matches!(
            self,
            RoomNodeType::Corridor | RoomNodeType::CorridorNS | RoomNodeType::CorridorEW
        )
    }

    pub fn is_boss_room(&self) -> bool {
        *self == RoomNodeType::BossRoom
    }

    pub fn is_none(&self) -> bool {
        *self == RoomNodeType::None
    }

    pub fn is_corridor_or_entrance(&self) -> bool {
        self.is_corridor() || self.is_entrance()
    }

    /// Ordinary rooms: everything that is not a corridor, entrance, boss room or `None`.
    pub fn is_room(&self) -> bool {
        matches!(
            self,
            RoomNodeType::SmallRoom
                | RoomNodeType::MediumRoom
                | RoomNodeType::LargeRoom
                | RoomNodeType::ChestRoom
        )
    }

    /// Whether a designer may pick this type directly in the graph editor.
    /// Oriented corridors are chosen by the engine, never by hand.
    pub fn display_in_node_graph_editor(&self) -> bool {
        !matches!(
            self,
            RoomNodeType::None | RoomNodeType::CorridorNS | RoomNodeType::CorridorEW
        )
    }

    /// Look up a type by its serialized (snake_case) name.
    pub fn from_key(key: &str) -> Option<Self> {
        RoomNodeType::ALL.iter().copied().find(|t| t.key() == key)
    }

    /// Serialized (snake_case) name.
    pub fn key(&self) -> &'static str {
        match self {
            RoomNodeType::None => "none",
            RoomNodeType::Entrance => "entrance",
            RoomNodeType::Corridor => "corridor",
            RoomNodeType::CorridorNS => "corridor_ns",
            RoomNodeType::CorridorEW => "corridor_ew",
            RoomNodeType::SmallRoom => "small_room",
            RoomNodeType::MediumRoom => "medium_room",
            RoomNodeType::LargeRoom => "large_room",
            RoomNodeType::ChestRoom => "chest_room",
            RoomNodeType::BossRoom => "boss_room",
        }
    }
}

impl std::fmt::Display for RoomNodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
