//! The single source of truth for the workflow graph.
//!
//! [`GraphStore`] owns the node and edge collections and every mutation that
//! touches them: CRUD, cascading deletes, the atomic splice insert used by
//! drag-and-drop, batch delta application, selection state, and the
//! serializable snapshot. Observers subscribe for synchronous notification
//! after each mutation completes; a notification is never delivered
//! mid-mutation.
//!
//! Common topology errors (removing an absent id, re-adding an existing
//! connection) are recovered locally as no-ops rather than surfaced to the
//! caller.

use crate::error::{InvariantViolation, ValidationError};
use crate::layout::NodePlacement;
use crate::node::{Edge, EdgeId, Node, NodeFactory, NodeId, NodeStatus, Point};
use crate::registry::{HandleDirection, KindRegistry, NodeKind};
use crate::selection::SelectionSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::rc::Rc;

/// The slices of store state an observer can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSlice {
    Nodes,
    Edges,
    LayoutMode,
}

/// Two-valued layout mode consumed only by presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Free,
    Fixed,
}

impl LayoutMode {
    fn toggled(self) -> LayoutMode {
        match self {
            LayoutMode::Free => LayoutMode::Fixed,
            LayoutMode::Fixed => LayoutMode::Free,
        }
    }
}

/// An externally-produced node delta (selection, position drag, removal).
#[derive(Debug, Clone)]
pub enum NodeChange {
    Position { id: NodeId, position: Point },
    Select { id: NodeId, selected: bool },
    Remove { id: NodeId },
}

/// An externally-produced edge delta.
#[derive(Debug, Clone)]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
}

/// One end of a (prospective) connection: a node and an optional handle id.
///
/// A `None` handle binds to the kind's first handle of the relevant
/// direction, mirroring the `"default"` token in edge-id derivation.
#[derive(Debug, Clone)]
pub struct EdgeEnd {
    pub node: NodeId,
    pub handle: Option<String>,
}

impl EdgeEnd {
    pub fn new(node: NodeId) -> Self {
        Self { node, handle: None }
    }

    pub fn with_handle(node: NodeId, handle: &str) -> Self {
        Self {
            node,
            handle: Some(handle.to_owned()),
        }
    }
}

/// Serializable `{nodes, edges}` snapshot for save/load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Identifier returned by [`GraphStore::subscribe`].
pub type SubscriberId = u64;

type SubscriberCallback = Box<dyn FnMut(&GraphStore, StoreSlice)>;

struct Subscriber {
    id: SubscriberId,
    filter: Option<StoreSlice>,
    callback: SubscriberCallback,
}

/// Single mutable container for nodes, edges, and editing state.
///
/// Collaborators share the store by explicit reference
/// (`Rc<RefCell<GraphStore>>`); there is no ambient global state. All
/// mutations are synchronous and run to completion before the next input
/// event is processed (single-threaded, event-driven execution).
pub struct GraphStore {
    kinds: Rc<KindRegistry>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    factory: NodeFactory,
    node_selection: SelectionSet<NodeId>,
    edge_selection: SelectionSet<EdgeId>,
    layout_mode: LayoutMode,
    layout_request: u64,
    subscribers: Vec<Subscriber>,
    next_subscriber: SubscriberId,
}

impl GraphStore {
    pub fn new(kinds: Rc<KindRegistry>) -> Self {
        Self {
            kinds,
            nodes: Vec::new(),
            edges: Vec::new(),
            factory: NodeFactory::new(),
            node_selection: SelectionSet::new(),
            edge_selection: SelectionSet::new(),
            layout_mode: LayoutMode::default(),
            layout_request: 0,
            subscribers: Vec::new(),
            next_subscriber: 1,
        }
    }

    // === Read accessors ===

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn selected_nodes(&self) -> &SelectionSet<NodeId> {
        &self.node_selection
    }

    pub fn selected_edges(&self) -> &SelectionSet<EdgeId> {
        &self.edge_selection
    }

    // === Node mutations ===

    /// Insert a fully-formed node (programmatic load).
    ///
    /// An id collision is an invariant violation: the node is rejected and
    /// the condition logged. On success the id generator is advanced past
    /// the inserted id.
    pub fn add_node(&mut self, node: Node) -> Result<(), InvariantViolation> {
        if self.contains_node(node.id) {
            log::error!("id collision inserting node {}", node.id);
            return Err(InvariantViolation::IdCollision(node.id));
        }
        self.factory.reserve_through(node.id);
        self.nodes.push(node);
        self.notify(StoreSlice::Nodes);
        Ok(())
    }

    /// Remove a node and every edge touching it. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) {
        let (nodes_changed, edges_changed) = self.remove_node_silent(id);
        if nodes_changed {
            self.notify(StoreSlice::Nodes);
        }
        if edges_changed {
            self.notify(StoreSlice::Edges);
        }
    }

    fn remove_node_silent(&mut self, id: NodeId) -> (bool, bool) {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            log::debug!("remove_node: node {id} not present, ignoring");
            return (false, false);
        }
        self.node_selection.set_selected(id, false);

        let removed_edges: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| e.touches(id))
            .map(|e| e.id.clone())
            .collect();
        self.edges.retain(|e| !e.touches(id));
        for edge_id in &removed_edges {
            self.edge_selection.set_selected(edge_id.clone(), false);
        }
        (true, !removed_edges.is_empty())
    }

    /// Create a node of `kind` centered on `position`. Always succeeds.
    pub fn add_node_by_type(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let kinds = Rc::clone(&self.kinds);
        let node = self.factory.build(kind, position, kinds.spec(kind));
        let id = node.id;
        self.nodes.push(node);
        self.notify(StoreSlice::Nodes);
        id
    }

    /// Splice a new node into a connection.
    ///
    /// With both endpoints present this removes the edge derived from
    /// `(source, target)` and replaces it with `source → new` and
    /// `new → target`, wired to the new kind's first target- and
    /// source-compatible handles. With a single endpoint (drop onto an open
    /// connection site) only the corresponding attachment edge is created.
    /// With neither, this degenerates to [`add_node_by_type`].
    ///
    /// The operation is atomic: endpoint and handle compatibility are
    /// validated before anything is mutated, so a failure leaves the graph
    /// untouched.
    ///
    /// [`add_node_by_type`]: GraphStore::add_node_by_type
    pub fn add_node_in_between(
        &mut self,
        kind: NodeKind,
        source: Option<EdgeEnd>,
        target: Option<EdgeEnd>,
        position: Point,
    ) -> Result<NodeId, ValidationError> {
        for end in source.iter().chain(target.iter()) {
            if !self.contains_node(end.node) {
                return Err(ValidationError::MissingNode(end.node));
            }
        }

        let kinds = Rc::clone(&self.kinds);
        let spec = kinds.spec(kind);
        let incoming = match source {
            Some(_) => Some(
                spec.first_handle(HandleDirection::Target)
                    .ok_or(ValidationError::NoCompatibleHandle {
                        kind,
                        direction: HandleDirection::Target,
                    })?,
            ),
            None => None,
        };
        let outgoing = match target {
            Some(_) => Some(
                spec.first_handle(HandleDirection::Source)
                    .ok_or(ValidationError::NoCompatibleHandle {
                        kind,
                        direction: HandleDirection::Source,
                    })?,
            ),
            None => None,
        };

        // Validation complete; everything below must succeed.
        let node = self.factory.build(kind, position, spec);
        let id = node.id;

        if let (Some(s), Some(t)) = (&source, &target) {
            let original = EdgeId::derive(
                s.node,
                s.handle.as_deref(),
                t.node,
                t.handle.as_deref(),
            );
            self.edges.retain(|e| e.id != original);
            self.edge_selection.set_selected(original, false);
        }

        self.nodes.push(node);
        if let (Some(s), Some(incoming)) = (&source, incoming) {
            self.push_edge_if_new(Edge::between(
                s.node,
                s.handle.as_deref(),
                id,
                Some(&incoming.id),
            ));
        }
        if let (Some(t), Some(outgoing)) = (&target, outgoing) {
            self.push_edge_if_new(Edge::between(
                id,
                Some(&outgoing.id),
                t.node,
                t.handle.as_deref(),
            ));
        }

        self.notify(StoreSlice::Nodes);
        self.notify(StoreSlice::Edges);
        Ok(id)
    }

    /// Shallow-merge `partial` into a node's attribute map. Absent ids are
    /// a no-op.
    pub fn update_node_data(
        &mut self,
        id: NodeId,
        partial: serde_json::Map<String, serde_json::Value>,
    ) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            log::debug!("update_node_data: node {id} not present, ignoring");
            return;
        };
        for (key, value) in partial {
            node.data.insert(key, value);
        }
        self.notify(StoreSlice::Nodes);
    }

    /// Advance a node's status. Illegal transitions (per the
    /// [`NodeStatus`] machine) and absent ids are no-ops.
    pub fn update_node_status(&mut self, id: NodeId, status: NodeStatus) {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            log::debug!("update_node_status: node {id} not present, ignoring");
            return;
        };
        if !node.status.can_transition(status) {
            log::debug!(
                "update_node_status: {:?} -> {:?} is not a legal transition for node {id}",
                node.status,
                status
            );
            return;
        }
        if node.status == status {
            return;
        }
        node.status = status;
        self.notify(StoreSlice::Nodes);
    }

    // === Edge mutations ===

    /// Add a connection. The candidate's id is re-derived from its
    /// endpoints, so issuing the same connection twice yields one edge.
    /// Candidates referencing absent nodes are rejected (no dangling edge
    /// is ever observable).
    pub fn add_edge(&mut self, candidate: Edge) {
        if !self.contains_node(candidate.source) || !self.contains_node(candidate.target) {
            log::warn!(
                "add_edge: endpoint missing for {} -> {}, ignoring",
                candidate.source,
                candidate.target
            );
            return;
        }
        if self.push_edge_if_new(candidate) {
            self.notify(StoreSlice::Edges);
        }
    }

    fn push_edge_if_new(&mut self, candidate: Edge) -> bool {
        let id = EdgeId::derive(
            candidate.source,
            candidate.source_handle.as_deref(),
            candidate.target,
            candidate.target_handle.as_deref(),
        );
        if self.edges.iter().any(|e| e.id == id) {
            log::debug!("add_edge: {id} already present, ignoring");
            return false;
        }
        self.edges.push(Edge { id, ..candidate });
        true
    }

    /// Remove an edge by id. Absent ids are a no-op.
    pub fn remove_edge(&mut self, id: &EdgeId) {
        let before = self.edges.len();
        self.edges.retain(|e| &e.id != id);
        if self.edges.len() == before {
            log::debug!("remove_edge: {id} not present, ignoring");
            return;
        }
        self.edge_selection.set_selected(id.clone(), false);
        self.notify(StoreSlice::Edges);
    }

    // === Batch deltas ===

    /// Apply a batch of node deltas atomically, in array order.
    /// Observers are notified once, after the whole batch.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        if changes.is_empty() {
            return;
        }
        let mut edges_changed = false;
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    match self.nodes.iter_mut().find(|n| n.id == *id) {
                        Some(node) => node.position = *position,
                        None => log::debug!("node change: {id} not present, ignoring"),
                    }
                }
                NodeChange::Select { id, selected } => {
                    self.node_selection.set_selected(*id, *selected);
                }
                NodeChange::Remove { id } => {
                    let (_, cascaded) = self.remove_node_silent(*id);
                    edges_changed |= cascaded;
                }
            }
        }
        self.notify(StoreSlice::Nodes);
        if edges_changed {
            self.notify(StoreSlice::Edges);
        }
    }

    /// Apply a batch of edge deltas atomically, in array order.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        if changes.is_empty() {
            return;
        }
        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    self.edge_selection.set_selected(id.clone(), *selected);
                }
                EdgeChange::Remove { id } => {
                    self.edges.retain(|e| &e.id != id);
                    self.edge_selection.set_selected(id.clone(), false);
                }
            }
        }
        self.notify(StoreSlice::Edges);
    }

    /// Click-style node selection (shift extends/toggles).
    pub fn select_node(&mut self, id: NodeId, shift_held: bool) {
        if !self.contains_node(id) {
            log::debug!("select_node: node {id} not present, ignoring");
            return;
        }
        self.node_selection.handle_interaction(id, shift_held);
        self.notify(StoreSlice::Nodes);
    }

    // === Layout mode & layout application ===

    /// Flip the fixed/free layout mode.
    pub fn toggle_layout_mode(&mut self) {
        self.layout_mode = self.layout_mode.toggled();
        self.notify(StoreSlice::LayoutMode);
    }

    /// Start a new layout request and return its token.
    ///
    /// Layout computation may run detached from the store (another task or
    /// thread); pairing each computation with a token makes
    /// last-request-wins explicit: [`apply_layout`] ignores any token other
    /// than the most recent.
    ///
    /// [`apply_layout`]: GraphStore::apply_layout
    pub fn begin_layout_request(&mut self) -> u64 {
        self.layout_request += 1;
        self.layout_request
    }

    pub fn current_layout_request(&self) -> u64 {
        self.layout_request
    }

    /// Apply computed placements if `request` is still the newest one.
    /// Returns `false` (leaving all positions untouched) for stale tokens.
    pub fn apply_layout(&mut self, request: u64, placements: &[NodePlacement]) -> bool {
        if request != self.layout_request {
            log::debug!(
                "apply_layout: discarding stale request {request} (current {})",
                self.layout_request
            );
            return false;
        }
        for placement in placements {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.id == placement.id) {
                node.position = Point::new(placement.x, placement.y);
            }
        }
        self.notify(StoreSlice::Nodes);
        true
    }

    // === Subscription ===

    /// Register an observer for state changes.
    ///
    /// `filter` of `None` observes every slice. The callback runs
    /// synchronously after each mutation completes and receives the store
    /// plus the slice that changed; it must use the provided reference
    /// rather than re-borrowing any outer `RefCell` holding this store.
    pub fn subscribe<F>(&mut self, filter: Option<StoreSlice>, callback: F) -> SubscriberId
    where
        F: FnMut(&GraphStore, StoreSlice) + 'static,
    {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove an observer. Unknown ids are a no-op.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|s| s.id != id);
    }

    fn notify(&mut self, slice: StoreSlice) {
        // Callbacks only get `&GraphStore`, so they cannot re-enter a
        // mutation or alter the subscriber list while it is detached.
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for subscriber in subscribers.iter_mut() {
            if subscriber.filter.map_or(true, |f| f == slice) {
                (subscriber.callback)(self, slice);
            }
        }
        self.subscribers = subscribers;
    }

    // === Snapshot ===

    /// Serializable copy of the current graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replace the graph with a snapshot.
    ///
    /// Duplicate node ids reject the whole load. Edges referencing missing
    /// nodes are dropped with a warning, and edge ids are re-derived from
    /// their endpoints. The id generator is advanced past the highest
    /// loaded id so later allocations cannot collide.
    pub fn load_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), InvariantViolation> {
        let mut seen = HashSet::new();
        for node in &snapshot.nodes {
            if !seen.insert(node.id) {
                log::error!("load_snapshot: duplicate node id {}", node.id);
                return Err(InvariantViolation::DuplicateSnapshotId(node.id));
            }
        }

        let edges: Vec<Edge> = snapshot
            .edges
            .into_iter()
            .filter(|e| {
                let ok = seen.contains(&e.source) && seen.contains(&e.target);
                if !ok {
                    log::warn!("load_snapshot: dropping dangling edge {}", e.id);
                }
                ok
            })
            .map(|e| Edge {
                id: EdgeId::derive(
                    e.source,
                    e.source_handle.as_deref(),
                    e.target,
                    e.target_handle.as_deref(),
                ),
                ..e
            })
            .collect();

        self.nodes = snapshot.nodes;
        self.edges = edges;
        self.node_selection.clear();
        self.edge_selection.clear();
        for id in seen {
            self.factory.reserve_through(id);
        }
        self.notify(StoreSlice::Nodes);
        self.notify(StoreSlice::Edges);
        Ok(())
    }
}
