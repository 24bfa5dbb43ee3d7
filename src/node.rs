//! Core node and edge data model for the workflow graph.
//!
//! Nodes are typed, positioned units (triggers and actions); edges are
//! directed connections between node handles. Edge ids are a pure function
//! of their endpoints, so re-issuing the same connection is idempotent.

use crate::registry::{KindSpec, NodeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node.
///
/// Ids are generator-assigned (see [`NodeFactory`]) and never reused within
/// a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Presentation status of a node.
///
/// The status machine is `Initial → Loading → {Success, Error}`; the two
/// final states are terminal until an external caller resets the node back
/// to `Initial`. Status has no effect on topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Initial,
    Loading,
    Success,
    Error,
}

impl NodeStatus {
    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Re-asserting the current status and resetting to `Initial` are always
    /// allowed; otherwise only the forward transitions of the machine are.
    pub fn can_transition(self, next: NodeStatus) -> bool {
        if self == next || next == NodeStatus::Initial {
            return true;
        }
        matches!(
            (self, next),
            (NodeStatus::Initial, NodeStatus::Loading)
                | (NodeStatus::Loading, NodeStatus::Success)
                | (NodeStatus::Loading, NodeStatus::Error)
        )
    }

    /// Success and Error are terminal (short of an external reset).
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }
}

/// A typed, positioned unit in the workflow graph.
///
/// `position` is the node's top-left corner in canvas space. `data` is a
/// kind-specific attribute map that is opaque to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub status: NodeStatus,
}

/// Handle id used in edge-id derivation when no explicit handle is given.
pub const DEFAULT_HANDLE: &str = "default";

/// Unique identifier for an edge, derived from its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Derive the id for a connection between two node handles.
    ///
    /// This is a pure function of the 4-tuple, so two attempts to connect
    /// the same handles produce the same id.
    pub fn derive(
        source: NodeId,
        source_handle: Option<&str>,
        target: NodeId,
        target_handle: Option<&str>,
    ) -> EdgeId {
        EdgeId(format!(
            "{}:{}->{}:{}",
            source,
            source_handle.unwrap_or(DEFAULT_HANDLE),
            target,
            target_handle.unwrap_or(DEFAULT_HANDLE),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed connection between two node handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
    /// Presentation-only flag; carried through the snapshot untouched.
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    /// Build an edge candidate between two node handles.
    ///
    /// The id is derived from the endpoints; see [`EdgeId::derive`].
    pub fn between(
        source: NodeId,
        source_handle: Option<&str>,
        target: NodeId,
        target_handle: Option<&str>,
    ) -> Edge {
        Edge {
            id: EdgeId::derive(source, source_handle, target, target_handle),
            source,
            target,
            source_handle: source_handle.map(str::to_owned),
            target_handle: target_handle.map(str::to_owned),
            animated: false,
        }
    }

    pub fn animated(mut self, animated: bool) -> Edge {
        self.animated = animated;
        self
    }

    /// Whether this edge references the given node as source or target.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// Builds node records and owns the id generator.
///
/// Ids increase monotonically and are never reused. Loading a snapshot must
/// advance the generator past the highest loaded id via [`reserve_through`]
/// so later allocations cannot collide.
///
/// [`reserve_through`]: NodeFactory::reserve_through
#[derive(Debug)]
pub struct NodeFactory {
    next_id: u64,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeFactory {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocate a fresh node id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build a node of `kind` centered on `center`.
    ///
    /// The stored position is the top-left corner, so the node's midpoint
    /// lands exactly on the given point.
    pub fn build(&mut self, kind: NodeKind, center: Point, spec: &KindSpec) -> Node {
        Node {
            id: self.next_id(),
            kind,
            position: Point::new(center.x - spec.width / 2.0, center.y - spec.height / 2.0),
            data: serde_json::Map::new(),
            status: NodeStatus::Initial,
        }
    }

    /// Ensure future ids are allocated strictly after `id`.
    pub fn reserve_through(&mut self, id: NodeId) {
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
    }

    /// The id the next allocation will return, without consuming it.
    pub fn peek_next(&self) -> NodeId {
        NodeId(self.next_id)
    }
}
