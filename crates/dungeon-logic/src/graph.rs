//! Room node graph: the designer-authored topology of a level.
//!
//! Nodes live in one arena and refer to each other by [`NodeId`] index.
//! Parent and child lists are kept symmetric by [`RoomNodeGraph::connect`];
//! graphs that arrive from elsewhere (deserialized, built with
//! `connect_unchecked`) are checked by [`RoomNodeGraph::validate`] before
//! any layout search runs.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::room_types::RoomNodeType;

/// A room may have at most this many corridors leading out of it.
pub const MAX_CHILD_CORRIDORS: usize = 3;

/// Index of a node in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNode {
    pub id: NodeId,
    pub node_type: RoomNodeType,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
}

/// Structural problems that make a graph unusable for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    Empty,
    NoEntrance,
    MultipleEntrances(Vec<NodeId>),
    EntranceHasParent(NodeId),
    UntypedNode(NodeId),
    UnknownNode { node: NodeId, reference: NodeId },
    SelfLink(NodeId),
    DuplicateLink { parent: NodeId, child: NodeId },
    AsymmetricLink { parent: NodeId, child: NodeId },
    Cycle(Vec<NodeId>),
    Unreachable(NodeId),
    CorridorArity { node: NodeId, parents: usize, children: usize },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::Empty => write!(f, "graph has no nodes"),
            GraphError::NoEntrance => write!(f, "graph has no entrance node"),
            GraphError::MultipleEntrances(ids) => {
                write!(f, "graph has {} entrance nodes, expected one", ids.len())
            }
            GraphError::EntranceHasParent(id) => write!(f, "entrance {} has a parent", id),
            GraphError::UntypedNode(id) => write!(f, "node {} has no room type", id),
            GraphError::UnknownNode { node, reference } => {
                write!(f, "node {} links to non-existent node {}", node, reference)
            }
            GraphError::SelfLink(id) => write!(f, "node {} links to itself", id),
            GraphError::DuplicateLink { parent, child } => {
                write!(f, "link {} -> {} appears more than once", parent, child)
            }
            GraphError::AsymmetricLink { parent, child } => write!(
                f,
                "link {} -> {} is not mirrored in both parent and child lists",
                parent, child
            ),
            GraphError::Cycle(ids) => match ids.first() {
                Some(id) => write!(f, "cycle through {} node(s), e.g. {}", ids.len(), id),
                None => write!(f, "cycle among the graph's nodes"),
            },
            GraphError::Unreachable(id) => write!(f, "node {} is not reachable from the entrance", id),
            GraphError::CorridorArity {
                node,
                parents,
                children,
            } => write!(
                f,
                "corridor {} has {} parent(s) and {} child(ren), expected one of each",
                node, parents, children
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Reasons the node editor refuses to draw a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    UnknownNode(NodeId),
    SelfLink,
    AlreadyLinked,
    WouldCreateCycle,
    ChildIsNone,
    ChildIsEntrance,
    SecondBossRoom,
    CorridorToCorridor,
    RoomToRoom,
    CorridorChildLimit,
    RoomCorridorLimit,
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::UnknownNode(id) => write!(f, "node {} does not exist", id),
            ConnectionError::SelfLink => write!(f, "a node cannot link to itself"),
            ConnectionError::AlreadyLinked => write!(f, "nodes are already linked"),
            ConnectionError::WouldCreateCycle => write!(f, "link would create a cycle"),
            ConnectionError::ChildIsNone => write!(f, "child has no room type"),
            ConnectionError::ChildIsEntrance => write!(f, "an entrance cannot be a child"),
            ConnectionError::SecondBossRoom => write!(f, "graph already has a linked boss room"),
            ConnectionError::CorridorToCorridor => write!(f, "corridors cannot link to corridors"),
            ConnectionError::RoomToRoom => write!(f, "rooms must be linked through a corridor"),
            ConnectionError::CorridorChildLimit => write!(f, "a corridor can only have one child"),
            ConnectionError::RoomCorridorLimit => write!(
                f,
                "a room can have at most {} child corridors",
                MAX_CHILD_CORRIDORS
            ),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Directed acyclic graph of room nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomNodeGraph {
    pub name: String,
    nodes: Vec<RoomNode>,
}

impl RoomNodeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node_type: RoomNodeType) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(RoomNode {
            id,
            node_type,
            parents: Vec::new(),
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&RoomNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[RoomNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All `(parent, child)` links in node order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.children.iter().map(move |&c| (n.id, c)))
    }

    pub fn entrance(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.node_type.is_entrance())
            .map(|n| n.id)
    }

    pub fn nodes_of_type(&self, node_type: RoomNodeType) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |n| n.node_type == node_type)
            .map(|n| n.id)
    }

    /// Distinct room types used by the graph, sorted.
    pub fn used_types(&self) -> Vec<RoomNodeType> {
        let mut types: Vec<RoomNodeType> = self.nodes.iter().map(|n| n.node_type).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Check whether `ancestor` can reach `node` by following child links.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![ancestor];
        while let Some(current) = stack.pop() {
            if current == node {
                return true;
            }
            let Some(n) = self.node(current) else { continue };
            if std::mem::replace(&mut seen[current.index()], true) {
                continue;
            }
            stack.extend(n.children.iter().copied());
        }
        false
    }

    /// The node editor's rules for drawing a link from `parent` to `child`.
    pub fn check_connection(&self, parent: NodeId, child: NodeId) -> Result<(), ConnectionError> {
        let p = self.node(parent).ok_or(ConnectionError::UnknownNode(parent))?;
        let c = self.node(child).ok_or(ConnectionError::UnknownNode(child))?;

        if parent == child {
            return Err(ConnectionError::SelfLink);
        }
        if p.children.contains(&child) {
            return Err(ConnectionError::AlreadyLinked);
        }
        if self.is_ancestor(child, parent) {
            return Err(ConnectionError::WouldCreateCycle);
        }
        if c.node_type.is_none() {
            return Err(ConnectionError::ChildIsNone);
        }
        if c.node_type.is_entrance() {
            return Err(ConnectionError::ChildIsEntrance);
        }
        if c.node_type.is_boss_room()
            && self
                .nodes
                .iter()
                .any(|n| n.id != child && n.node_type.is_boss_room() && !n.parents.is_empty())
        {
            return Err(ConnectionError::SecondBossRoom);
        }
        match (p.node_type.is_corridor(), c.node_type.is_corridor()) {
            (true, true) => return Err(ConnectionError::CorridorToCorridor),
            (false, false) => return Err(ConnectionError::RoomToRoom),
            _ => {}
        }
        if p.node_type.is_corridor() && !p.children.is_empty() {
            return Err(ConnectionError::CorridorChildLimit);
        }
        if c.node_type.is_corridor() && p.children.len() >= MAX_CHILD_CORRIDORS {
            return Err(ConnectionError::RoomCorridorLimit);
        }
        Ok(())
    }

    /// Link `parent -> child` if the editor rules allow it.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<(), ConnectionError> {
        self.check_connection(parent, child)?;
        self.link(parent, child);
        Ok(())
    }

    /// Link `parent -> child` without the editor rules. Only existence,
    /// self-links and duplicates are rejected; everything else is left to
    /// [`RoomNodeGraph::validate`].
    pub fn connect_unchecked(&mut self, parent: NodeId, child: NodeId) -> Result<(), ConnectionError> {
        if self.node(parent).is_none() {
            return Err(ConnectionError::UnknownNode(parent));
        }
        if self.node(child).is_none() {
            return Err(ConnectionError::UnknownNode(child));
        }
        if parent == child {
            return Err(ConnectionError::SelfLink);
        }
        if self.nodes[parent.index()].children.contains(&child) {
            return Err(ConnectionError::AlreadyLinked);
        }
        self.link(parent, child);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parents.push(parent);
    }

    /// Full structural validation. Linear in nodes + links.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }
        self.check_links()?;

        if let Some(n) = self.nodes.iter().find(|n| n.node_type.is_none()) {
            return Err(GraphError::UntypedNode(n.id));
        }

        let entrances: Vec<NodeId> = self.nodes_of_type(RoomNodeType::Entrance).collect();
        let entrance = match entrances.as_slice() {
            [] => return Err(GraphError::NoEntrance),
            [one] => *one,
            _ => return Err(GraphError::MultipleEntrances(entrances)),
        };
        if !self.nodes[entrance.index()].parents.is_empty() {
            return Err(GraphError::EntranceHasParent(entrance));
        }

        // Kahn from every root: anything left over sits on a cycle.
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.parents.is_empty())
            .map(|n| n.id)
            .collect();
        let (_, remaining) = self.kahn(&roots);
        if !remaining.is_empty() {
            return Err(GraphError::Cycle(remaining));
        }

        if let Some(&orphan) = roots.iter().find(|&&r| r != entrance) {
            return Err(GraphError::Unreachable(orphan));
        }

        for n in &self.nodes {
            if n.node_type.is_corridor() && (n.parents.len() != 1 || n.children.len() != 1) {
                return Err(GraphError::CorridorArity {
                    node: n.id,
                    parents: n.parents.len(),
                    children: n.children.len(),
                });
            }
        }
        Ok(())
    }

    fn check_links(&self) -> Result<(), GraphError> {
        let count = self.nodes.len() as u32;
        for n in &self.nodes {
            for &c in &n.children {
                if c.0 >= count {
                    return Err(GraphError::UnknownNode { node: n.id, reference: c });
                }
                if c == n.id {
                    return Err(GraphError::SelfLink(n.id));
                }
                if n.children.iter().filter(|&&x| x == c).count() > 1 {
                    return Err(GraphError::DuplicateLink { parent: n.id, child: c });
                }
                if !self.nodes[c.index()].parents.contains(&n.id) {
                    return Err(GraphError::AsymmetricLink { parent: n.id, child: c });
                }
            }
            for &p in &n.parents {
                if p.0 >= count {
                    return Err(GraphError::UnknownNode { node: n.id, reference: p });
                }
                if p == n.id {
                    return Err(GraphError::SelfLink(n.id));
                }
                if n.parents.iter().filter(|&&x| x == p).count() > 1 {
                    return Err(GraphError::DuplicateLink { parent: p, child: n.id });
                }
                if !self.nodes[p.index()].children.contains(&n.id) {
                    return Err(GraphError::AsymmetricLink { parent: p, child: n.id });
                }
            }
        }
        Ok(())
    }

    /// Kahn's algorithm from `roots`, children visited in list order.
    /// Returns the processed order and the nodes never released.
    fn kahn(&self, roots: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
        let mut pending: Vec<usize> = self.nodes.iter().map(|n| n.parents.len()).collect();
        let mut queue: VecDeque<NodeId> = roots.iter().copied().collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut released = vec![false; self.nodes.len()];
        for r in roots {
            released[r.index()] = true;
        }

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &c in &self.nodes[id.index()].children {
                pending[c.index()] -= 1;
                if pending[c.index()] == 0 && !released[c.index()] {
                    released[c.index()] = true;
                    queue.push_back(c);
                }
            }
        }

        let remaining = self
            .nodes
            .iter()
            .filter(|n| !released[n.id.index()])
            .map(|n| n.id)
            .collect();
        (order, remaining)
    }

    /// Breadth-first order from the entrance in which every node comes after
    /// all of its parents. Validates the graph first.
    pub fn placement_order(&self) -> Result<Vec<NodeId>, GraphError> {
        self.validate()?;
        let entrance = self.entrance().ok_or(GraphError::NoEntrance)?;
        let (order, _) = self.kahn(&[entrance]);
        Ok(order)
    }
}
