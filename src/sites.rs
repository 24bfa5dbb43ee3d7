//! Connection sites and proximity detection.
//!
//! Every handle with zero attached edges is an open *connection site*,
//! registered here with its absolute canvas position. During a drag the
//! controller queries the registry each pointer-move for the nearest
//! compatible site; a hit inside the threshold is published as the current
//! [`PotentialConnection`] until the drag ends.
//!
//! The query is an O(n) linear scan over currently-open sites, which is fine
//! while the open-handle count stays bounded by the node count. Very large
//! graphs would want a spatial index (grid buckets or a k-d tree) behind
//! this same interface.

use crate::node::{Edge, Node, NodeId, Point};
use crate::registry::{HandleDirection, KindRegistry};
use std::collections::HashMap;
use std::fmt;

/// Distance (canvas units) under which a site can become a potential
/// connection. The boundary is exclusive: a site at exactly this distance
/// does not match.
pub const PROXIMITY_THRESHOLD: f32 = 150.0;

/// Identifies one handle on one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteId {
    pub node: NodeId,
    pub handle: String,
}

impl SiteId {
    pub fn new(node: NodeId, handle: &str) -> Self {
        Self {
            node,
            handle: handle.to_owned(),
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.handle)
    }
}

/// An unconnected attachment point, eligible for proximity matching.
#[derive(Debug, Clone)]
pub struct ConnectionSite {
    pub id: SiteId,
    pub position: Point,
    pub direction: HandleDirection,
}

impl ConnectionSite {
    /// The node this site belongs to.
    pub fn owner(&self) -> NodeId {
        self.id.node
    }
}

/// The nearest matching site for an in-progress drag.
#[derive(Debug, Clone)]
pub struct PotentialConnection {
    pub site: ConnectionSite,
    pub distance: f32,
}

/// Parameters for a proximity query.
///
/// `direction` is the direction of the dragged endpoint: sites of the
/// *same* direction are filtered out (a source never matches a source).
/// `exclude` lists nodes whose sites must be ignored, typically the node
/// currently being dragged, to prevent self-connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityQuery<'a> {
    pub direction: Option<HandleDirection>,
    pub exclude: &'a [NodeId],
}

/// Tracks every currently-open attachment point.
#[derive(Debug, Default)]
pub struct ConnectionSiteRegistry {
    sites: HashMap<SiteId, ConnectionSite>,
    potential: Option<PotentialConnection>,
}

impl ConnectionSiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open site. Re-registering an id overwrites its position.
    pub fn register(&mut self, site: ConnectionSite) {
        self.sites.insert(site.id.clone(), site);
    }

    /// Remove a site (its handle connected, or its owner went away).
    pub fn deregister(&mut self, id: &SiteId) {
        self.sites.remove(id);
    }

    /// Remove every site owned by `node`.
    pub fn deregister_node(&mut self, node: NodeId) {
        self.sites.retain(|id, _| id.node != node);
    }

    /// Recompute the open-site map from graph topology.
    ///
    /// A handle is open iff no edge is attached to it; an edge with no
    /// explicit handle id binds to the kind's first handle of the matching
    /// direction. Site positions are `node position + handle offset`.
    pub fn rebuild(&mut self, nodes: &[Node], edges: &[Edge], kinds: &KindRegistry) {
        self.sites.clear();
        for node in nodes {
            let spec = kinds.spec(node.kind);
            for handle in &spec.handles {
                let connected = edges.iter().any(|edge| match handle.direction {
                    HandleDirection::Source => {
                        edge.source == node.id
                            && spec
                                .resolve_handle(
                                    edge.source_handle.as_deref(),
                                    HandleDirection::Source,
                                )
                                .is_some_and(|h| h.id == handle.id)
                    }
                    HandleDirection::Target => {
                        edge.target == node.id
                            && spec
                                .resolve_handle(
                                    edge.target_handle.as_deref(),
                                    HandleDirection::Target,
                                )
                                .is_some_and(|h| h.id == handle.id)
                    }
                });
                if !connected {
                    self.register(ConnectionSite {
                        id: SiteId::new(node.id, &handle.id),
                        position: node.position.offset(handle.offset.x, handle.offset.y),
                        direction: handle.direction,
                    });
                }
            }
        }
        log::debug!("site registry rebuilt: {} open sites", self.sites.len());
    }

    /// Find the nearest compatible site to `pointer` and publish it as the
    /// potential connection if it is inside [`PROXIMITY_THRESHOLD`];
    /// otherwise clear the potential connection.
    ///
    /// Matching is pure nearest-point-within-threshold; ties on distance
    /// break toward the lower owning node id so repeated queries are stable.
    pub fn check_for_potential_connection(
        &mut self,
        pointer: Point,
        query: ProximityQuery<'_>,
    ) -> Option<&PotentialConnection> {
        let nearest = self
            .sites
            .values()
            .filter(|site| query.direction != Some(site.direction))
            .filter(|site| !query.exclude.contains(&site.owner()))
            .map(|site| (site, pointer.distance_to(site.position)))
            .min_by(|(a, da), (b, db)| {
                da.total_cmp(db)
                    .then_with(|| a.id.node.cmp(&b.id.node))
                    .then_with(|| a.id.handle.cmp(&b.id.handle))
            });

        match nearest {
            Some((site, distance)) if distance < PROXIMITY_THRESHOLD => {
                self.potential = Some(PotentialConnection {
                    site: site.clone(),
                    distance,
                });
            }
            _ => self.potential = None,
        }
        self.potential.as_ref()
    }

    /// The currently-published potential connection, if any.
    pub fn potential(&self) -> Option<&PotentialConnection> {
        self.potential.as_ref()
    }

    /// Consume the potential connection (drop resolution).
    pub fn take_potential(&mut self) -> Option<PotentialConnection> {
        self.potential.take()
    }

    /// Clear the potential connection (drag cancelled).
    pub fn clear_potential(&mut self) {
        self.potential = None;
    }

    pub fn site(&self, id: &SiteId) -> Option<&ConnectionSite> {
        self.sites.get(id)
    }

    pub fn sites(&self) -> impl Iterator<Item = &ConnectionSite> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
