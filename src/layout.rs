//! Layered (hierarchical) graph layout.
//!
//! Computes positions for the whole graph with the Sugiyama algorithm via
//! the `rust-sugiyama` crate: nodes are ranked into layers by topological
//! depth, ordered within layers to reduce crossings, and layers are placed
//! sequentially along the primary axis. Disconnected components are placed
//! side by side along the secondary axis; isolated nodes are single-node
//! components and still receive valid positions.
//!
//! The computation is a pure function over plain data, so callers may
//! offload it (the algorithm can take non-trivial time on large graphs).
//! The engine itself does not track request ordering; pair each run with a
//! store layout-request token and apply results through
//! [`GraphStore::apply_layout`] to get last-request-wins behavior.
//!
//! Coordinates are `f64` internally because `rust-sugiyama` operates in
//! `f64`; results are converted back to the `f32` canvas space on output.
//!
//! Determinism: inputs are ordered (nodes sorted by id, node-level edges
//! deduplicated through an ordered set, components ordered by minimum
//! member id), so re-running on unchanged topology reproduces identical
//! positions.
//!
//! [`GraphStore::apply_layout`]: crate::store::GraphStore::apply_layout

use crate::error::LayoutError;
use crate::node::NodeId;
use crate::store::GraphStore;
use std::collections::{BTreeSet, HashMap};

/// Layout direction.
///
/// Marked `#[non_exhaustive]` so additional directions (e.g. `RightToLeft`,
/// `BottomToTop`) can be added in future versions without breaking callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Direction {
    /// Layers flow top to bottom (default).
    #[default]
    TopToBottom,
    /// Layers flow left to right.
    LeftToRight,
}

/// Configuration for the layout algorithm.
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Minimum spacing between vertices (0.0 uses the `rust-sugiyama`
    /// default of 10.0).
    pub vertex_spacing: f64,
    /// Gap between disconnected components along the secondary axis.
    pub component_spacing: f64,
    /// Layout direction.
    pub direction: Direction,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertex_spacing: 0.0,
            component_spacing: 80.0,
            direction: Direction::TopToBottom,
        }
    }
}

/// A positioned node returned by [`compute_layout`].
///
/// `x`/`y` are the node's top-left corner in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

/// Compute layered layout positions for the given graph.
///
/// Takes nodes as `(id, (width, height))` pairs and edges as
/// `(source_id, target_id)` pairs. Node ids are mapped to dense `u32`
/// indices internally and translated back before returning. Duplicate node
/// ids are collapsed (first occurrence wins); duplicate and self-loop edges
/// are dropped.
///
/// An edge referencing an id absent from `nodes` rejects the whole
/// computation with [`LayoutError::UnknownNode`] — no partial result is
/// ever produced.
pub fn compute_layout(
    nodes: &[(NodeId, (f64, f64))],
    edges: &[(NodeId, NodeId)],
    config: &LayoutConfig,
) -> Result<Vec<NodePlacement>, LayoutError> {
    if nodes.is_empty() {
        if let Some(&(bad, _)) = edges.first() {
            return Err(LayoutError::UnknownNode(bad));
        }
        return Ok(Vec::new());
    }

    let horizontal = config.direction == Direction::LeftToRight;

    // Dense index mapping in sorted-id order (first occurrence wins)
    let mut sizes: HashMap<NodeId, (f64, f64)> = HashMap::new();
    let mut idx_to_id: Vec<NodeId> = Vec::with_capacity(nodes.len());
    for &(id, size) in nodes {
        if !sizes.contains_key(&id) {
            sizes.insert(id, size);
            idx_to_id.push(id);
        }
    }
    idx_to_id.sort();
    let id_to_idx: HashMap<NodeId, u32> = idx_to_id
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx as u32))
        .collect();

    // Validate edges before anything else; reject malformed input wholesale
    for &(src, dst) in edges {
        if !id_to_idx.contains_key(&src) {
            return Err(LayoutError::UnknownNode(src));
        }
        if !id_to_idx.contains_key(&dst) {
            return Err(LayoutError::UnknownNode(dst));
        }
    }

    // Deduplicate through an ordered set so input order cannot leak into
    // the result; self-loops carry no ranking information and are dropped.
    let mapped_edges: Vec<(u32, u32)> = edges
        .iter()
        .filter(|(src, dst)| src != dst)
        .map(|&(src, dst)| (id_to_idx[&src], id_to_idx[&dst]))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // For horizontal layout, swap width/height so the algorithm spaces
    // layers along what will become the x-axis.
    let vertices: Vec<(u32, (f64, f64))> = idx_to_id
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let (w, h) = sizes[id];
            let size = if horizontal { (h, w) } else { (w, h) };
            (idx as u32, size)
        })
        .collect();

    let mut sg_config = rust_sugiyama::configure::Config::default();
    if config.vertex_spacing > 0.0 {
        sg_config.vertex_spacing = config.vertex_spacing;
    }

    // Run layout — returns one (positions, width, height) entry per
    // weakly-connected component.
    let subgraphs = rust_sugiyama::from_vertices_and_edges(&vertices, &mapped_edges, &sg_config);

    // Translate indices back to ids, undoing the axis swap.
    let mut components: Vec<Vec<(NodeId, (f64, f64))>> = Vec::with_capacity(subgraphs.len());
    for (layout, _width, _height) in &subgraphs {
        let mut component = Vec::with_capacity(layout.len());
        for &(idx, (x, y)) in layout {
            let id = *idx_to_id
                .get(idx)
                .ok_or(LayoutError::Incomplete(NodeId(idx as u64)))?;
            let (px, py) = if horizontal { (y, x) } else { (x, y) };
            component.push((id, (px, py)));
        }
        components.push(component);
    }

    // Components side by side along the secondary axis, ordered by their
    // smallest member id.
    components.sort_by_key(|component| component.iter().map(|&(id, _)| id).min());

    let secondary_extent = |id: NodeId| -> f64 {
        let (w, h) = sizes[&id];
        if horizontal {
            h
        } else {
            w
        }
    };

    let mut placements = Vec::with_capacity(idx_to_id.len());
    let mut offset = 0.0_f64;
    for component in components {
        let min_sec = component
            .iter()
            .map(|&(_, (x, y))| if horizontal { y } else { x })
            .fold(f64::INFINITY, f64::min);
        let max_sec = component
            .iter()
            .map(|&(id, (x, y))| {
                let sec = if horizontal { y } else { x };
                sec + secondary_extent(id)
            })
            .fold(f64::NEG_INFINITY, f64::max);
        let shift = offset - min_sec;

        for (id, (x, y)) in component {
            let (px, py) = if horizontal {
                (x, y + shift)
            } else {
                (x + shift, y)
            };
            placements.push(NodePlacement {
                id,
                x: px as f32,
                y: py as f32,
            });
        }
        offset += (max_sec - min_sec) + config.component_spacing;
    }

    if placements.len() != idx_to_id.len() {
        let placed: BTreeSet<NodeId> = placements.iter().map(|p| p.id).collect();
        let missing = idx_to_id
            .iter()
            .find(|id| !placed.contains(id))
            .copied()
            .unwrap_or(NodeId(0));
        return Err(LayoutError::Incomplete(missing));
    }

    placements.sort_by_key(|p| p.id);
    Ok(placements)
}

/// Compute layout for a store's current graph, reading node dimensions from
/// its kind registry.
pub fn compute_for_store(
    store: &GraphStore,
    config: &LayoutConfig,
) -> Result<Vec<NodePlacement>, LayoutError> {
    let nodes: Vec<(NodeId, (f64, f64))> = store
        .nodes()
        .iter()
        .map(|node| {
            let spec = store.kinds().spec(node.kind);
            (node.id, (spec.width as f64, spec.height as f64))
        })
        .collect();
    let edges: Vec<(NodeId, NodeId)> = store
        .edges()
        .iter()
        .map(|edge| (edge.source, edge.target))
        .collect();
    compute_layout(&nodes, &edges, config)
}
