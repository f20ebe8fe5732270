//! Backtracking layout search.
//!
//! Nodes are placed in the graph's breadth-first placement order, each one
//! only after all of its parents. A node is anchored on its first parent:
//! every pairing of an unused parent doorway with an opposite-facing doorway
//! on a matching template is a candidate. Candidates that overlap an
//! existing room, or that fail to mate with the node's other parents, are
//! rejected. When a node runs out of candidates the search steps back to the
//! previous node and tries its next candidate.
//!
//! All placement state is private to one attempt. Callers see either a
//! complete [`PlacedRoomSet`] or a [`LayoutFailure`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use dungeon_logic::geometry::GridPos;
use dungeon_logic::graph::{GraphError, NodeId, RoomNodeGraph};
use dungeon_logic::level::{DungeonLevel, LevelError};
use dungeon_logic::placement::{child_lower_bounds, PlacedRoom, PlacedRoomSet};
use dungeon_logic::room_types::RoomNodeType;
use dungeon_logic::template::{RoomTemplateLibrary, TemplateId};

use super::config::{LayoutConfig, SelectionPolicy};

/// Why no layout was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutFailure {
    /// The library has no entrance template
    NoEntranceTemplate,
    /// A node type used by the graph has no template
    MissingTemplateForType(RoomNodeType),
    /// Every attempt failed or was abandoned
    ExhaustedAttempts { attempts: u32 },
    /// The graph failed validation; detected before any search
    MalformedGraph(GraphError),
    /// The level definition failed validation
    InvalidLevel(LevelError),
}

impl From<GraphError> for LayoutFailure {
    fn from(e: GraphError) -> Self {
        LayoutFailure::MalformedGraph(e)
    }
}

impl From<LevelError> for LayoutFailure {
    fn from(e: LevelError) -> Self {
        LayoutFailure::InvalidLevel(e)
    }
}

impl std::fmt::Display for LayoutFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutFailure::NoEntranceTemplate => write!(f, "no entrance template in library"),
            LayoutFailure::MissingTemplateForType(t) => write!(f, "no template for room type {}", t),
            LayoutFailure::ExhaustedAttempts { attempts } => {
                write!(f, "no valid layout after {} attempt(s)", attempts)
            }
            LayoutFailure::MalformedGraph(e) => write!(f, "malformed graph: {}", e),
            LayoutFailure::InvalidLevel(e) => write!(f, "invalid level: {}", e),
        }
    }
}

impl std::error::Error for LayoutFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutFailure::MalformedGraph(e) => Some(e),
            LayoutFailure::InvalidLevel(e) => Some(e),
            _ => None,
        }
    }
}

/// Lay out `graph` with templates from `templates`.
///
/// Under [`SelectionPolicy::FirstFit`] the search ignores the seed, so a
/// failed attempt is final and no retries are made.
pub fn generate_layout(
    graph: &RoomNodeGraph,
    templates: &RoomTemplateLibrary,
    config: &LayoutConfig,
) -> Result<PlacedRoomSet, LayoutFailure> {
    let prepared = prepare(graph, templates)?;
    run_attempts(std::slice::from_ref(&prepared), templates, config)
}

/// Lay out a level, picking one of its graphs per attempt.
///
/// Graph and template problems surface as their own [`LayoutFailure`]
/// variants; whatever else the level check rejects is
/// [`LayoutFailure::InvalidLevel`].
pub fn generate_level(level: &DungeonLevel, config: &LayoutConfig) -> Result<PlacedRoomSet, LayoutFailure> {
    let prepared = level
        .graphs
        .iter()
        .map(|g| prepare(g, &level.templates))
        .collect::<Result<Vec<_>, _>>()?;
    level.check()?;
    run_attempts(&prepared, &level.templates, config)
}

/// A graph that passed the pre-search checks, with its placement order.
struct Prepared<'a> {
    graph: &'a RoomNodeGraph,
    order: Vec<NodeId>,
}

fn prepare<'a>(graph: &'a RoomNodeGraph, templates: &RoomTemplateLibrary) -> Result<Prepared<'a>, LayoutFailure> {
    let order = graph.placement_order()?;

    if !templates.has_type(RoomNodeType::Entrance) {
        return Err(LayoutFailure::NoEntranceTemplate);
    }
    for node_type in graph.used_types() {
        let available = if node_type == RoomNodeType::Corridor {
            templates.has_type(RoomNodeType::CorridorNS) || templates.has_type(RoomNodeType::CorridorEW)
        } else {
            templates.has_type(node_type)
        };
        if !available {
            return Err(LayoutFailure::MissingTemplateForType(node_type));
        }
    }

    Ok(Prepared { graph, order })
}

fn run_attempts(
    prepared: &[Prepared<'_>],
    templates: &RoomTemplateLibrary,
    config: &LayoutConfig,
) -> Result<PlacedRoomSet, LayoutFailure> {
    let retry_can_differ = config.selection == SelectionPolicy::Random || prepared.len() > 1;

    for attempt in 0..config.max_attempts {
        let seed = config.attempt_seed(attempt);
        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = if prepared.len() > 1 {
            &prepared[rng.gen_range(0..prepared.len())]
        } else if let Some(only) = prepared.first() {
            only
        } else {
            break;
        };
        let name = &chosen.graph.name;

        match Search::new(chosen, templates, config, rng).run() {
            Outcome::Placed(rooms) => {
                log::info!(
                    "Generated layout '{}': {} rooms, {} attempt(s), seed {}",
                    name,
                    rooms.len(),
                    attempt + 1,
                    seed
                );
                return Ok(PlacedRoomSet::new(name.clone(), seed, attempt + 1, rooms));
            }
            Outcome::NoValidPlacement => {
                log::debug!("Layout attempt {} for '{}' (seed {}) found no placement", attempt + 1, name, seed);
            }
            Outcome::Cancelled { steps } => {
                log::warn!(
                    "Layout attempt {} for '{}' (seed {}) abandoned after {} steps",
                    attempt + 1,
                    name,
                    seed,
                    steps
                );
            }
        }

        if !retry_can_differ {
            return Err(LayoutFailure::ExhaustedAttempts { attempts: attempt + 1 });
        }
    }

    Err(LayoutFailure::ExhaustedAttempts {
        attempts: config.max_attempts,
    })
}

// ── Search ──────────────────────────────────────────────────────────────

/// Doorway pair joining a node to one of its parents.
#[derive(Debug, Clone, Copy)]
struct Link {
    parent: NodeId,
    parent_doorway: usize,
    child_doorway: usize,
}

/// One way to place a node.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    template: TemplateId,
    /// Resolved type; generic corridors become NS or EW here
    node_type: RoomNodeType,
    lower: GridPos,
    /// `None` for the entrance
    anchor: Option<Link>,
}

struct Frame {
    node: NodeId,
    candidates: Vec<Candidate>,
    next: usize,
}

enum Outcome {
    Placed(Vec<PlacedRoom>),
    NoValidPlacement,
    Cancelled { steps: u64 },
}

struct Search<'a> {
    graph: &'a RoomNodeGraph,
    order: &'a [NodeId],
    templates: &'a RoomTemplateLibrary,
    config: &'a LayoutConfig,
    rng: StdRng,
    /// Working placement, indexed by node
    placed: Vec<Option<PlacedRoom>>,
    steps: u64,
}

impl<'a> Search<'a> {
    fn new(
        prepared: &'a Prepared<'_>,
        templates: &'a RoomTemplateLibrary,
        config: &'a LayoutConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            graph: prepared.graph,
            order: &prepared.order,
            templates,
            config,
            rng,
            placed: vec![None; prepared.graph.len()],
            steps: 0,
        }
    }

    fn run(mut self) -> Outcome {
        let Some(&root) = self.order.first() else {
            return Outcome::NoValidPlacement;
        };
        let mut frames = vec![self.frame(root)];

        while let Some(frame) = frames.last_mut() {
            let node = frame.node;
            self.unplace(node);

            let mut accepted = false;
            while let Some(&candidate) = frame.candidates.get(frame.next) {
                frame.next += 1;
                self.steps += 1;
                if self.steps > self.config.max_search_steps {
                    return Outcome::Cancelled { steps: self.steps - 1 };
                }
                if let Some((room, links)) = self.fit(node, &candidate) {
                    self.place(node, room, &links);
                    accepted = true;
                    break;
                }
            }

            if !accepted {
                // NoValidPlacement at this node: step back to the previous one
                frames.pop();
                continue;
            }

            match self.order.get(frames.len()) {
                Some(&next) => {
                    let frame = self.frame(next);
                    frames.push(frame);
                }
                None => {
                    return match self.placed.into_iter().collect::<Option<Vec<_>>>() {
                        Some(rooms) => Outcome::Placed(rooms),
                        None => Outcome::NoValidPlacement,
                    };
                }
            }
        }

        Outcome::NoValidPlacement
    }

    /// Enumerate candidates for `node` against the current placement.
    fn frame(&mut self, node: NodeId) -> Frame {
        let mut candidates = Vec::new();
        let parents = &self.graph.nodes()[node.index()].parents;
        let declared = self.graph.nodes()[node.index()].node_type;

        match parents.first() {
            None => {
                for id in self.templates.of_type(RoomNodeType::Entrance) {
                    if let Some(t) = self.templates.get(id) {
                        candidates.push(Candidate {
                            template: id,
                            node_type: RoomNodeType::Entrance,
                            lower: t.lower_bounds,
                            anchor: None,
                        });
                    }
                }
            }
            Some(&parent) => {
                if let Some(parent_room) = self.placed[parent.index()].as_ref() {
                    for pd in parent_room.unconnected_doorways() {
                        let node_type = if declared == RoomNodeType::Corridor {
                            pd.orientation.corridor_type()
                        } else {
                            declared
                        };
                        for id in self.templates.of_type(node_type) {
                            let Some(t) = self.templates.get(id) else { continue };
                            for child_doorway in t.doorways_facing(pd.orientation.opposite()) {
                                let Some(lower) = child_lower_bounds(pd, t, child_doorway) else {
                                    continue;
                                };
                                candidates.push(Candidate {
                                    template: id,
                                    node_type,
                                    lower,
                                    anchor: Some(Link {
                                        parent,
                                        parent_doorway: pd.index,
                                        child_doorway,
                                    }),
                                });
                            }
                        }
                    }
                }
            }
        }

        if self.config.selection == SelectionPolicy::Random {
            candidates.shuffle(&mut self.rng);
        }
        Frame {
            node,
            candidates,
            next: 0,
        }
    }

    /// Stamp `candidate` and check it against the placement so far.
    /// Returns the room with its own doorways connected and the parent
    /// doorways to connect on acceptance.
    fn fit(&self, node: NodeId, candidate: &Candidate) -> Option<(PlacedRoom, Vec<Link>)> {
        let template = self.templates.get(candidate.template)?;
        let mut room = PlacedRoom::new(node, candidate.node_type, candidate.template, template, candidate.lower);
        let parents = &self.graph.nodes()[node.index()].parents;

        for other in self.placed.iter().flatten() {
            // parents are meant to touch at the seam
            let padding = if parents.contains(&other.node) {
                0
            } else {
                self.config.overlap_padding
            };
            if room.bounds.overlaps_with_padding(&other.bounds, padding) {
                return None;
            }
        }

        let mut links = Vec::with_capacity(parents.len());
        if let Some(anchor) = candidate.anchor {
            let d = room.doorways.get_mut(anchor.child_doorway)?;
            d.connected = true;
            d.connected_to = Some(anchor.parent);
            links.push(anchor);
        }

        for &parent in parents.iter().skip(1) {
            let parent_room = self.placed[parent.index()].as_ref()?;
            let (parent_doorway, child_doorway) = parent_room
                .unconnected_doorways()
                .find_map(|pd| {
                    room.doorways
                        .iter()
                        .find(|cd| !cd.connected && pd.mates_with(cd))
                        .map(|cd| (pd.index, cd.index))
                })?;
            let d = &mut room.doorways[child_doorway];
            d.connected = true;
            d.connected_to = Some(parent);
            links.push(Link {
                parent,
                parent_doorway,
                child_doorway,
            });
        }

        Some((room, links))
    }

    fn place(&mut self, node: NodeId, room: PlacedRoom, links: &[Link]) {
        for link in links {
            if let Some(d) = self.placed[link.parent.index()]
                .as_mut()
                .and_then(|p| p.doorways.get_mut(link.parent_doorway))
            {
                d.connected = true;
                d.connected_to = Some(node);
            }
        }
        self.placed[node.index()] = Some(room);
    }

    /// Undo `node`'s placement, if any, releasing the parent doorways it used.
    fn unplace(&mut self, node: NodeId) {
        let Some(room) = self.placed[node.index()].take() else {
            return;
        };
        for other in room.doorways.iter().filter_map(|d| d.connected_to) {
            if let Some(other_room) = self.placed[other.index()].as_mut() {
                for d in other_room.doorways.iter_mut().filter(|d| d.connected_to == Some(node)) {
                    d.connected = false;
                    d.connected_to = None;
                }
            }
        }
    }
}
