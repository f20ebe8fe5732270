//! Room templates: concrete blueprints that satisfy a room node type.
//!
//! Template coordinates are local to the template's own tile grid; the
//! layout engine translates them into world tiles when a room is placed.

use serde::{Deserialize, Serialize};

use crate::geometry::{GridPos, TileRect};
use crate::room_types::RoomNodeType;
use crate::tilemap::TileLayer;

/// Which wall of a room a doorway sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    North,
    South,
    East,
    West,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::South,
        Orientation::East,
        Orientation::West,
    ];

    /// The orientation a doorway must have to mate with this one.
    pub fn opposite(&self) -> Orientation {
        match self {
            Orientation::North => Orientation::South,
            Orientation::South => Orientation::North,
            Orientation::East => Orientation::West,
            Orientation::West => Orientation::East,
        }
    }

    /// Unit step pointing out of the room through this wall.
    pub fn outward(&self) -> GridPos {
        match self {
            Orientation::North => GridPos::new(0, 1),
            Orientation::South => GridPos::new(0, -1),
            Orientation::East => GridPos::new(1, 0),
            Orientation::West => GridPos::new(-1, 0),
        }
    }

    /// North and south doorways lie on horizontal walls.
    pub fn is_vertical_passage(&self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }

    /// The oriented corridor type a generic corridor becomes when entered
    /// through a doorway of this orientation.
    pub fn corridor_type(&self) -> RoomNodeType {
        if self.is_vertical_passage() {
            RoomNodeType::CorridorNS
        } else {
            RoomNodeType::CorridorEW
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Orientation::North => "north",
            Orientation::South => "south",
            Orientation::East => "east",
            Orientation::West => "west",
        };
        f.write_str(s)
    }
}

/// A connection point on a template's boundary.
///
/// Whether a doorway ended up connected is a property of a placed room,
/// never of the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doorway {
    /// Anchor tile in template-local coordinates
    pub position: GridPos,
    pub orientation: Orientation,
    /// Door object to instantiate when the doorway connects, if any
    #[serde(default)]
    pub door: Option<String>,
    /// First tile of the wall strip copied across the gap when sealing
    pub copy_start: GridPos,
    pub copy_width: u32,
    pub copy_height: u32,
}

impl Doorway {
    pub fn new(position: GridPos, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
            door: None,
            copy_start: position,
            copy_width: 1,
            copy_height: 1,
        }
    }

    pub fn with_door(mut self, door: impl Into<String>) -> Self {
        self.door = Some(door.into());
        self
    }

    pub fn with_seal(mut self, copy_start: GridPos, copy_width: u32, copy_height: u32) -> Self {
        self.copy_start = copy_start;
        self.copy_width = copy_width;
        self.copy_height = copy_height;
        self
    }
}

/// Index of a template inside a [`RoomTemplateLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

impl TemplateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable room blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub name: String,
    pub node_type: RoomNodeType,
    pub lower_bounds: GridPos,
    pub upper_bounds: GridPos,
    pub doorways: Vec<Doorway>,
    #[serde(default)]
    pub spawn_positions: Vec<GridPos>,
    #[serde(default)]
    pub layers: Vec<TileLayer>,
}

impl RoomTemplate {
    pub fn new(
        name: impl Into<String>,
        node_type: RoomNodeType,
        lower_bounds: GridPos,
        upper_bounds: GridPos,
    ) -> Self {
        Self {
            name: name.into(),
            node_type,
            lower_bounds,
            upper_bounds,
            doorways: Vec::new(),
            spawn_positions: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn with_doorway(mut self, doorway: Doorway) -> Self {
        self.doorways.push(doorway);
        self
    }

    pub fn with_spawn(mut self, pos: GridPos) -> Self {
        self.spawn_positions.push(pos);
        self
    }

    pub fn with_layer(mut self, layer: TileLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn bounds(&self) -> TileRect {
        TileRect::new(self.lower_bounds, self.upper_bounds)
    }

    /// Footprint width in tiles.
    pub fn width(&self) -> i32 {
        self.bounds().width()
    }

    /// Footprint height in tiles.
    pub fn height(&self) -> i32 {
        self.bounds().height()
    }

    pub fn has_doorway(&self, orientation: Orientation) -> bool {
        self.doorways.iter().any(|d| d.orientation == orientation)
    }

    /// Indices of doorways with the given orientation, in declaration order.
    pub fn doorways_facing(&self, orientation: Orientation) -> impl Iterator<Item = usize> + '_ {
        self.doorways
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.orientation == orientation)
            .map(|(i, _)| i)
    }
}

/// The set of templates available to a level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomTemplateLibrary {
    templates: Vec<RoomTemplate>,
}

impl RoomTemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, template: RoomTemplate) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    pub fn get(&self, id: TemplateId) -> Option<&RoomTemplate> {
        self.templates.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &RoomTemplate)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (TemplateId(i as u32), t))
    }

    /// All templates tagged with `node_type`, in library order.
    pub fn of_type(&self, node_type: RoomNodeType) -> Vec<TemplateId> {
        self.iter()
            .filter(|(_, t)| t.node_type == node_type)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_type(&self, node_type: RoomNodeType) -> bool {
        self.templates.iter().any(|t| t.node_type == node_type)
    }

    pub fn find_by_name(&self, name: &str) -> Option<TemplateId> {
        self.iter().find(|(_, t)| t.name == name).map(|(id, _)| id)
    }
}

impl FromIterator<RoomTemplate> for RoomTemplateLibrary {
    fn from_iter<I: IntoIterator<Item = RoomTemplate>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().collect(),
        }
    }
}
