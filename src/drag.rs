//! Palette drag-and-drop insertion.
//!
//! [`DragController`] consumes pointer events for a palette drag, converts
//! screen coordinates to canvas space, re-queries site proximity on every
//! move, and on drop resolves either a standalone placement or an
//! attachment to the nearest open site. Cancelling a drag leaves the graph
//! untouched.
//!
//! The controller is an explicit state machine:
//! `Idle → (pointer_down) Dragging → (pointer_move)* → (drop | cancel) → Idle`.

use crate::node::{NodeId, Point};
use crate::registry::{HandleDirection, NodeKind};
use crate::sites::{ConnectionSiteRegistry, PotentialConnection, ProximityQuery};
use crate::store::{EdgeEnd, GraphStore};
use crate::ValidationError;
use std::cell::RefCell;
use std::rc::Rc;

/// Screen↔canvas conversion state, owned by the rendering layer and pushed
/// into the controller whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self { zoom, pan_x, pan_y }
    }

    /// Convert a screen-space point to canvas space:
    /// `canvas = (screen - pan) / zoom`, guarding against a zero zoom.
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        let z = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Point::new((screen.x - self.pan_x) / z, (screen.y - self.pan_y) / z)
    }

    /// Convert a canvas-space point to screen space.
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.zoom + self.pan_x,
            canvas.y * self.zoom + self.pan_y,
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum DragPhase {
    Idle,
    Dragging { kind: NodeKind, canvas: Point },
}

/// How a drop resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No potential connection: the node was placed standalone.
    Placed(NodeId),
    /// A potential connection existed: the node was wired to that site.
    Attached(NodeId),
}

impl DropOutcome {
    pub fn node_id(&self) -> NodeId {
        match self {
            DropOutcome::Placed(id) | DropOutcome::Attached(id) => *id,
        }
    }
}

/// Drives palette drags against the store and the site registry.
///
/// Share the store and registry with the rest of the application through
/// the usual `Rc<RefCell<_>>` references.
pub struct DragController {
    store: Rc<RefCell<GraphStore>>,
    sites: Rc<RefCell<ConnectionSiteRegistry>>,
    viewport: Viewport,
    phase: DragPhase,
}

impl DragController {
    pub fn new(
        store: Rc<RefCell<GraphStore>>,
        sites: Rc<RefCell<ConnectionSiteRegistry>>,
    ) -> Self {
        Self {
            store,
            sites,
            viewport: Viewport::default(),
            phase: DragPhase::Idle,
        }
    }

    /// Push the current viewport state (called by the rendering layer).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Begin dragging a palette item of `kind` at a screen position.
    ///
    /// The open-site map is rebuilt from current topology so proximity
    /// queries during this drag see fresh data.
    pub fn pointer_down(&mut self, kind: NodeKind, screen: Point) {
        let canvas = self.viewport.screen_to_canvas(screen);
        {
            let store = self.store.borrow();
            self.sites
                .borrow_mut()
                .rebuild(store.nodes(), store.edges(), store.kinds());
        }
        self.phase = DragPhase::Dragging { kind, canvas };
        self.evaluate_proximity(canvas);
    }

    /// Update the drag position and re-query proximity. Returns the current
    /// potential connection, if any. A no-op while idle.
    pub fn pointer_move(&mut self, screen: Point) -> Option<PotentialConnection> {
        let DragPhase::Dragging { kind, .. } = self.phase else {
            return None;
        };
        let canvas = self.viewport.screen_to_canvas(screen);
        self.phase = DragPhase::Dragging { kind, canvas };
        self.evaluate_proximity(canvas)
    }

    fn evaluate_proximity(&mut self, canvas: Point) -> Option<PotentialConnection> {
        // The dragged node does not exist yet, so there is nothing to
        // exclude and either site direction can match.
        self.sites
            .borrow_mut()
            .check_for_potential_connection(
                canvas,
                ProximityQuery {
                    direction: None,
                    exclude: &[],
                },
            )
            .cloned()
    }

    /// Drop the dragged item, mutating the store.
    ///
    /// With a potential connection the new node is wired to that site
    /// (the site's owner becomes the other endpoint); otherwise the node is
    /// placed standalone at the pointer's canvas position. Returns `None`
    /// while idle.
    pub fn drop(&mut self) -> Option<Result<DropOutcome, ValidationError>> {
        let DragPhase::Dragging { kind, canvas } = self.phase else {
            return None;
        };
        self.phase = DragPhase::Idle;

        let potential = self.sites.borrow_mut().take_potential();
        let mut store = self.store.borrow_mut();
        let result = match potential {
            Some(potential) => {
                let end = EdgeEnd::with_handle(
                    potential.site.owner(),
                    &potential.site.id.handle,
                );
                let spliced = match potential.site.direction {
                    // Open source handle: the existing node feeds the new one
                    HandleDirection::Source => {
                        store.add_node_in_between(kind, Some(end), None, canvas)
                    }
                    // Open target handle: the new node feeds the existing one
                    HandleDirection::Target => {
                        store.add_node_in_between(kind, None, Some(end), canvas)
                    }
                };
                spliced.map(DropOutcome::Attached)
            }
            None => Ok(DropOutcome::Placed(store.add_node_by_type(kind, canvas))),
        };
        Some(result)
    }

    /// Abandon the drag: no graph mutation, potential connection cleared.
    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
        self.sites.borrow_mut().clear_potential();
    }
}
