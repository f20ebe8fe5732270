//! Layout validation for generated dungeons.
//!
//! Pure functions that take a placed room set and its graph and return
//! validation errors. Used by the integration tests and the harness.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::graph::RoomNodeGraph;
use crate::placement::PlacedRoomSet;
use crate::room_types::RoomNodeType;

/// A layout validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Coverage ─────────────────────────────────────────────────────────

/// Check that every graph node has exactly one placed room, in node order.
pub fn check_every_node_placed(set: &PlacedRoomSet, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if set.len() != graph.len() {
        errors.push(ValidationError {
            category: "coverage",
            severity: Severity::Error,
            message: format!("{} rooms placed for {} graph nodes", set.len(), graph.len()),
        });
    }
    for node in graph.nodes() {
        match set.get(node.id) {
            None => errors.push(ValidationError {
                category: "coverage",
                severity: Severity::Error,
                message: format!("Node {} ({}) has no placed room", node.id, node.node_type),
            }),
            Some(room) if room.node != node.id => errors.push(ValidationError {
                category: "coverage",
                severity: Severity::Error,
                message: format!("Room slot {} holds node {}", node.id, room.node),
            }),
            Some(room) => {
                let type_ok = if node.node_type == RoomNodeType::Corridor {
                    room.node_type.is_corridor_ns() || room.node_type.is_corridor_ew()
                } else {
                    room.node_type == node.node_type
                };
                if !type_ok {
                    errors.push(ValidationError {
                        category: "coverage",
                        severity: Severity::Error,
                        message: format!(
                            "Node {} is a {} but was placed as a {}",
                            node.id, node.node_type, room.node_type
                        ),
                    });
                }
            }
        }
    }
    errors
}

// ── B. Room-to-room (pairwise) ──────────────────────────────────────────

/// Check no two placed rooms share a tile.
pub fn check_room_overlaps(set: &PlacedRoomSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = set.rooms();
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            if rooms[i].bounds.overlaps(&rooms[j].bounds) {
                errors.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Error,
                    message: format!("Rooms {} and {} overlap", rooms[i].node, rooms[j].node),
                });
            }
        }
    }
    errors
}

// ── C. Doorways ─────────────────────────────────────────────────────────

/// Check that every graph edge is carried by a pair of mated, connected doorways.
pub fn check_edges_mated(set: &PlacedRoomSet, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (parent, child) in graph.edges() {
        let (Some(p), Some(c)) = (set.get(parent), set.get(child)) else {
            continue; // reported by check_every_node_placed
        };
        match (p.doorway_to(child), c.doorway_to(parent)) {
            (Some(pd), Some(cd)) => {
                if !pd.connected || !cd.connected {
                    errors.push(ValidationError {
                        category: "doorway",
                        severity: Severity::Error,
                        message: format!("Edge {} -> {} doorways not marked connected", parent, child),
                    });
                }
                if !pd.mates_with(cd) {
                    errors.push(ValidationError {
                        category: "doorway",
                        severity: Severity::Error,
                        message: format!(
                            "Edge {} -> {}: {} doorway at {} does not mate with {} doorway at {}",
                            parent, child, pd.orientation, pd.position, cd.orientation, cd.position
                        ),
                    });
                }
            }
            _ => errors.push(ValidationError {
                category: "doorway",
                severity: Severity::Error,
                message: format!("Edge {} -> {} has no doorway pair", parent, child),
            }),
        }
    }
    errors
}

/// Check that connected doorways correspond to graph edges and nothing else.
pub fn check_unused_doorways(set: &PlacedRoomSet, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for room in set.iter() {
        let Some(node) = graph.node(room.node) else { continue };
        let mut linked = 0;
        for d in &room.doorways {
            match (d.connected, d.connected_to) {
                (false, None) => {}
                (true, Some(other)) if node.parents.contains(&other) || node.children.contains(&other) => {
                    linked += 1;
                }
                _ => errors.push(ValidationError {
                    category: "doorway",
                    severity: Severity::Error,
                    message: format!(
                        "Room {} doorway {} is connected to {:?} without a graph edge",
                        room.node, d.index, d.connected_to
                    ),
                }),
            }
        }
        let expected = node.parents.len() + node.children.len();
        if linked != expected {
            errors.push(ValidationError {
                category: "doorway",
                severity: Severity::Error,
                message: format!(
                    "Room {} has {} connected doorways for {} graph edges",
                    room.node, linked, expected
                ),
            });
        }
    }
    errors
}

// ── D. Connectivity ─────────────────────────────────────────────────────

/// BFS over connected doorways from the entrance: every room must be reachable.
pub fn check_connectivity(set: &PlacedRoomSet) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Some(entrance) = set.entrance() else {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: "Layout has no entrance room".to_string(),
        });
        return errors;
    };

    let mut visited = vec![false; set.len()];
    let mut queue = VecDeque::new();
    visited[entrance.node.index()] = true;
    queue.push_back(entrance.node);

    while let Some(current) = queue.pop_front() {
        let Some(room) = set.get(current) else { continue };
        for next in room.connected_doorways().filter_map(|d| d.connected_to) {
            if let Some(seen) = visited.get_mut(next.index()) {
                if !*seen {
                    *seen = true;
                    queue.push_back(next);
                }
            }
        }
    }

    for room in set.iter() {
        if !visited[room.node.index()] {
            errors.push(ValidationError {
                category: "connectivity",
                severity: Severity::Error,
                message: format!("Room {} ({}) is unreachable from the entrance", room.node, room.template_name),
            });
        }
    }
    errors
}

/// Run every layout check.
pub fn validate_layout(set: &PlacedRoomSet, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_every_node_placed(set, graph));
    all.extend(check_room_overlaps(set));
    all.extend(check_edges_mated(set, graph));
    all.extend(check_unused_doorways(set, graph));
    all.extend(check_connectivity(set));
    all
}
