//! JSON level assets.
//!
//! The authoring format names graph nodes with strings and lists each node's
//! parents and children by those names. Loading resolves the names into the
//! arena graph and rejects anything that does not line up.
//!
//! ```json
//! {
//!   "name": "Level 1",
//!   "layout": { "max_attempts": 20 },
//!   "settings": { "tile_size": 1.0 },
//!   "templates": [ { "name": "hall", "node_type": "entrance", ... } ],
//!   "graphs": [
//!     { "name": "short", "nodes": [
//!       { "id": "start", "type": "entrance", "children": ["c1"] },
//!       { "id": "c1", "type": "corridor", "parents": ["start"], "children": ["boss"] },
//!       { "id": "boss", "type": "boss_room", "parents": ["c1"] }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use dungeon_logic::graph::{ConnectionError, NodeId, RoomNodeGraph};
use dungeon_logic::level::DungeonLevel;
use dungeon_logic::room_types::RoomNodeType;
use dungeon_logic::settings::DungeonSettings;
use dungeon_logic::template::{RoomTemplate, RoomTemplateLibrary};

use crate::generation::LayoutConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetGraph {
    pub name: String,
    pub nodes: Vec<AssetNode>,
}

/// On-disk level definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelAsset {
    pub name: String,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub settings: DungeonSettings,
    pub templates: Vec<RoomTemplate>,
    pub graphs: Vec<AssetGraph>,
}

/// A level ready to generate: definition plus its configuration.
#[derive(Debug, Clone)]
pub struct LoadedLevel {
    pub level: DungeonLevel,
    pub layout: LayoutConfig,
    pub settings: DungeonSettings,
}

#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateTemplate(String),
    /// A tile layer whose cell count disagrees with its width and height
    MalformedLayer { template: String, layer: usize, expected: usize, found: usize },
    DuplicateNode { graph: String, node: String },
    UnknownNode { graph: String, node: String, reference: String },
    UnknownRoomType { graph: String, node: String, room_type: String },
    AsymmetricLink { graph: String, parent: String, child: String },
    Link { graph: String, parent: String, child: String, error: ConnectionError },
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(e: serde_json::Error) -> Self {
        AssetError::Json(e)
    }
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "IO error: {}", e),
            AssetError::Json(e) => write!(f, "JSON error: {}", e),
            AssetError::DuplicateTemplate(name) => write!(f, "Duplicate template name '{}'", name),
            AssetError::MalformedLayer {
                template,
                layer,
                expected,
                found,
            } => write!(
                f,
                "Template '{}': layer {} has {} tiles, expected {}",
                template, layer, found, expected
            ),
            AssetError::DuplicateNode { graph, node } => {
                write!(f, "Graph '{}': duplicate node id '{}'", graph, node)
            }
            AssetError::UnknownNode { graph, node, reference } => write!(
                f,
                "Graph '{}': node '{}' refers to unknown node '{}'",
                graph, node, reference
            ),
            AssetError::UnknownRoomType { graph, node, room_type } => write!(
                f,
                "Graph '{}': node '{}' has unknown room type '{}'",
                graph, node, room_type
            ),
            AssetError::AsymmetricLink { graph, parent, child } => write!(
                f,
                "Graph '{}': link '{}' -> '{}' is not listed on both nodes",
                graph, parent, child
            ),
            AssetError::Link { graph, parent, child, error } => {
                write!(f, "Graph '{}': cannot link '{}' -> '{}': {}", graph, parent, child, error)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Json(e) => Some(e),
            AssetError::Link { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl AssetGraph {
    /// Resolve string ids into an arena graph. Structural validation
    /// (cycles, entrance rules) is left to [`RoomNodeGraph::validate`].
    pub fn to_graph(&self) -> Result<RoomNodeGraph, AssetError> {
        let mut graph = RoomNodeGraph::new(self.name.clone());
        let mut ids: HashMap<&str, NodeId> = HashMap::new();

        for node in &self.nodes {
            let node_type = RoomNodeType::from_key(&node.node_type).ok_or_else(|| AssetError::UnknownRoomType {
                graph: self.name.clone(),
                node: node.id.clone(),
                room_type: node.node_type.clone(),
            })?;
            if ids.insert(node.id.as_str(), graph.add_node(node_type)).is_some() {
                return Err(AssetError::DuplicateNode {
                    graph: self.name.clone(),
                    node: node.id.clone(),
                });
            }
        }

        let resolve = |node: &AssetNode, reference: &str| {
            ids.get(reference).copied().ok_or_else(|| AssetError::UnknownNode {
                graph: self.name.clone(),
                node: node.id.clone(),
                reference: reference.to_string(),
            })
        };

        let mut child_links = HashSet::new();
        let mut parent_links = HashSet::new();
        for node in &self.nodes {
            for child in &node.children {
                resolve(node, child)?;
                child_links.insert((node.id.as_str(), child.as_str()));
            }
            for parent in &node.parents {
                resolve(node, parent)?;
                parent_links.insert((parent.as_str(), node.id.as_str()));
            }
        }
        if let Some(&(parent, child)) = child_links.symmetric_difference(&parent_links).min() {
            return Err(AssetError::AsymmetricLink {
                graph: self.name.clone(),
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        for node in &self.nodes {
            let parent = resolve(node, &node.id)?;
            for child in &node.children {
                let child_id = resolve(node, child)?;
                graph
                    .connect_unchecked(parent, child_id)
                    .map_err(|error| AssetError::Link {
                        graph: self.name.clone(),
                        parent: node.id.clone(),
                        child: child.clone(),
                        error,
                    })?;
            }
        }
        Ok(graph)
    }
}

impl LevelAsset {
    pub fn into_level(self) -> Result<LoadedLevel, AssetError> {
        let mut names = HashSet::new();
        for t in &self.templates {
            if !names.insert(t.name.as_str()) {
                return Err(AssetError::DuplicateTemplate(t.name.clone()));
            }
            if let Some((index, layer)) = t.layers.iter().enumerate().find(|(_, l)| !l.is_well_formed()) {
                return Err(AssetError::MalformedLayer {
                    template: t.name.clone(),
                    layer: index,
                    expected: layer.width as usize * layer.height as usize,
                    found: layer.tiles.len(),
                });
            }
        }
        let graphs = self
            .graphs
            .iter()
            .map(AssetGraph::to_graph)
            .collect::<Result<Vec<_>, _>>()?;
        let templates: RoomTemplateLibrary = self.templates.into_iter().collect();

        Ok(LoadedLevel {
            level: DungeonLevel {
                name: self.name,
                templates,
                graphs,
            },
            layout: self.layout,
            settings: self.settings,
        })
    }
}

pub fn load_level_from_str(json: &str) -> Result<LoadedLevel, AssetError> {
    let asset: LevelAsset = serde_json::from_str(json)?;
    let loaded = asset.into_level()?;
    log::info!(
        "Loaded level '{}': {} templates, {} graphs",
        loaded.level.name,
        loaded.level.templates.len(),
        loaded.level.graphs.len()
    );
    Ok(loaded)
}

pub fn load_level_from_file(path: impl AsRef<Path>) -> Result<LoadedLevel, AssetError> {
    let json = std::fs::read_to_string(path)?;
    load_level_from_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"{
        "name": "Test Level",
        "layout": { "seed": 9 },
        "templates": [
            { "name": "hall", "node_type": "entrance",
              "lower_bounds": {"x": 0, "y": 0}, "upper_bounds": {"x": 6, "y": 6},
              "doorways": [
                { "position": {"x": 6, "y": 3}, "orientation": "east",
                  "copy_start": {"x": 6, "y": 4}, "copy_width": 1, "copy_height": 1 }
              ] },
            { "name": "passage", "node_type": "corridor_ew",
              "lower_bounds": {"x": 0, "y": 0}, "upper_bounds": {"x": 4, "y": 2},
              "doorways": [
                { "position": {"x": 0, "y": 1}, "orientation": "west",
                  "copy_start": {"x": 0, "y": 2}, "copy_width": 1, "copy_height": 1 },
                { "position": {"x": 4, "y": 1}, "orientation": "east",
                  "copy_start": {"x": 4, "y": 2}, "copy_width": 1, "copy_height": 1 }
              ] }
        ],
        "graphs": [
            { "name": "pair", "nodes": [
                { "id": "start", "type": "entrance", "children": ["hall"] },
                { "id": "hall", "type": "corridor", "parents": ["start"] }
            ] }
        ]
    }"#;

    #[test]
    fn test_load_level() {
        let loaded = load_level_from_str(LEVEL).unwrap();
        assert_eq!(loaded.level.name, "Test Level");
        assert_eq!(loaded.layout.seed, 9);
        assert_eq!(loaded.layout.max_attempts, 10);
        assert_eq!(loaded.settings, DungeonSettings::default());
        assert_eq!(loaded.level.templates.len(), 2);

        let g = &loaded.level.graphs[0];
        assert_eq!(g.len(), 2);
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(NodeId(0), NodeId(1))]);
        assert_eq!(g.node(NodeId(1)).unwrap().node_type, RoomNodeType::Corridor);
    }

    fn graph(nodes: serde_json::Value) -> Result<RoomNodeGraph, AssetError> {
        let g: AssetGraph = serde_json::from_value(serde_json::json!({ "name": "g", "nodes": nodes })).unwrap();
        g.to_graph()
    }

    #[test]
    fn test_unknown_reference() {
        let err = graph(serde_json::json!([
            { "id": "a", "type": "entrance", "children": ["ghost"] }
        ]));
        assert!(matches!(err, Err(AssetError::UnknownNode { reference, .. }) if reference == "ghost"));
    }

    #[test]
    fn test_unknown_room_type() {
        let err = graph(serde_json::json!([{ "id": "a", "type": "kitchen" }]));
        assert!(matches!(err, Err(AssetError::UnknownRoomType { .. })));
    }

    #[test]
    fn test_duplicate_node() {
        let err = graph(serde_json::json!([
            { "id": "a", "type": "entrance" },
            { "id": "a", "type": "small_room" }
        ]));
        assert!(matches!(err, Err(AssetError::DuplicateNode { .. })));
    }

    #[test]
    fn test_asymmetric_link() {
        let err = graph(serde_json::json!([
            { "id": "a", "type": "entrance", "children": ["b"] },
            { "id": "b", "type": "corridor" }
        ]));
        assert!(matches!(
            err,
            Err(AssetError::AsymmetricLink { parent, child, .. }) if parent == "a" && child == "b"
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(load_level_from_str("{"), Err(AssetError::Json(_))));
    }

    #[test]
    fn test_layer_tile_count_must_match_size() {
        let json = LEVEL.replacen(
            r#""node_type": "corridor_ew","#,
            r#""node_type": "corridor_ew",
              "layers": [
                { "kind": "ground", "origin": {"x": 0, "y": 0}, "width": 5, "height": 3,
                  "tiles": [] }
              ],"#,
            1,
        );
        let err = load_level_from_str(&json).unwrap_err();
        assert!(matches!(
            &err,
            AssetError::MalformedLayer { template, layer: 0, expected: 15, found: 0 } if template == "passage"
        ));
        assert_eq!(err.to_string(), "Template 'passage': layer 0 has 0 tiles, expected 15");
    }
}
