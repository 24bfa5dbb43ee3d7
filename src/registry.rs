//! Node-kind registry: the closed catalog of node types and their handles.
//!
//! Per-kind dispatch (sizes, handle layout) is resolved once at startup from
//! the [`NodeKind`] enumeration rather than through runtime string lookups.
//! The surrounding application may override entries before wiring the
//! registry into the store.

use crate::node::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of node kinds this core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Swap,
    Stake,
    Transfer,
}

impl NodeKind {
    /// All kinds, in registry order.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Trigger,
        NodeKind::Swap,
        NodeKind::Stake,
        NodeKind::Transfer,
    ];

    fn index(self) -> usize {
        match self {
            NodeKind::Trigger => 0,
            NodeKind::Swap => 1,
            NodeKind::Stake => 2,
            NodeKind::Transfer => 3,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Swap => "swap",
            NodeKind::Stake => "stake",
            NodeKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Whether a handle emits connections (source) or accepts them (target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleDirection {
    Source,
    Target,
}

impl HandleDirection {
    pub fn opposite(self) -> HandleDirection {
        match self {
            HandleDirection::Source => HandleDirection::Target,
            HandleDirection::Target => HandleDirection::Source,
        }
    }
}

impl fmt::Display for HandleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleDirection::Source => f.write_str("source"),
            HandleDirection::Target => f.write_str("target"),
        }
    }
}

/// A named attachment point on a node kind.
///
/// `offset` is relative to the node's top-left corner.
#[derive(Debug, Clone)]
pub struct HandleSpec {
    pub id: String,
    pub direction: HandleDirection,
    pub offset: Point,
}

impl HandleSpec {
    pub fn new(id: &str, direction: HandleDirection, offset: Point) -> Self {
        Self {
            id: id.to_owned(),
            direction,
            offset,
        }
    }
}

/// Display metadata, fixed dimensions, and handle descriptors for one kind.
#[derive(Debug, Clone)]
pub struct KindSpec {
    pub label: String,
    pub width: f32,
    pub height: f32,
    pub handles: Vec<HandleSpec>,
}

impl KindSpec {
    /// First handle of the given direction, in declaration order.
    ///
    /// Edges that carry no explicit handle id bind to this handle.
    pub fn first_handle(&self, direction: HandleDirection) -> Option<&HandleSpec> {
        self.handles.iter().find(|h| h.direction == direction)
    }

    /// Look up a handle by id.
    pub fn handle(&self, id: &str) -> Option<&HandleSpec> {
        self.handles.iter().find(|h| h.id == id)
    }

    /// Resolve an optional edge handle id to a concrete handle of the given
    /// direction, falling back to the first declared one.
    pub fn resolve_handle(
        &self,
        id: Option<&str>,
        direction: HandleDirection,
    ) -> Option<&HandleSpec> {
        match id {
            Some(id) => self.handle(id).filter(|h| h.direction == direction),
            None => self.first_handle(direction),
        }
    }
}

/// Closed kind → spec mapping, resolved once at startup.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    specs: [KindSpec; NodeKind::ALL.len()],
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl KindRegistry {
    /// The built-in catalog.
    ///
    /// Triggers expose a single source handle at the bottom edge; action
    /// kinds expose a target handle on the top edge and a source handle on
    /// the bottom edge, both horizontally centered.
    pub fn standard() -> Self {
        fn action(label: &str) -> KindSpec {
            KindSpec {
                label: label.to_owned(),
                width: 240.0,
                height: 120.0,
                handles: vec![
                    HandleSpec::new("in", HandleDirection::Target, Point::new(120.0, 0.0)),
                    HandleSpec::new("out", HandleDirection::Source, Point::new(120.0, 120.0)),
                ],
            }
        }

        Self {
            specs: [
                KindSpec {
                    label: "Trigger".to_owned(),
                    width: 240.0,
                    height: 100.0,
                    handles: vec![HandleSpec::new(
                        "out",
                        HandleDirection::Source,
                        Point::new(120.0, 100.0),
                    )],
                },
                action("Swap"),
                action("Stake"),
                action("Transfer"),
            ],
        }
    }

    /// The spec for a kind. Total over the closed enumeration.
    pub fn spec(&self, kind: NodeKind) -> &KindSpec {
        &self.specs[kind.index()]
    }

    /// Replace the spec for a kind (application-side customization).
    pub fn set_spec(&mut self, kind: NodeKind, spec: KindSpec) {
        self.specs[kind.index()] = spec;
    }
}
