//! Error taxonomy for the graph-editing core.
//!
//! Topology errors favor silent idempotent recovery and are mostly consumed
//! internally as logged no-ops; layout errors are surfaced to the caller so
//! the UI can report them without discarding the existing graph; invariant
//! violations indicate misuse that must not occur and are logged at error
//! level before being rejected.

use crate::node::NodeId;
use crate::registry::{HandleDirection, NodeKind};
use thiserror::Error;

/// A mutation referenced a nonexistent id or an incompatible handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    #[error("kind {kind} has no {direction} handle")]
    NoCompatibleHandle {
        kind: NodeKind,
        direction: HandleDirection,
    },
}

/// The layout engine received malformed input or produced an unusable
/// result. Existing positions are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("edge references unknown node {0}")]
    UnknownNode(NodeId),
    #[error("layout produced no position for node {0}")]
    Incomplete(NodeId),
}

/// A condition that must not occur under correct usage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("node id {0} is already present")]
    IdCollision(NodeId),
    #[error("snapshot contains duplicate node id {0}")]
    DuplicateSnapshotId(NodeId),
}
