//! # Flowgraph Core
//!
//! A headless graph-editing core for building visual workflow editors.
//! Users compose a directed graph of typed action nodes (triggers, swaps,
//! stakes, transfers) connected by edges; this crate owns the data model
//! and the editing algorithms, and leaves rendering, persistence I/O, and
//! natural-language generation to the surrounding application.
//!
//! ## Features
//!
//! - **Single source of truth** - [`GraphStore`] holds nodes, edges,
//!   selection, and notifies subscribers synchronously after each mutation
//! - **Drag-and-drop insertion** - [`DragController`] resolves a palette
//!   drop into "place standalone" or "wire to the nearest open handle"
//! - **Proximity detection** - [`ConnectionSiteRegistry`] tracks every
//!   unconnected attachment point and answers nearest-site queries
//! - **Automatic layout** - a deterministic layered (Sugiyama) layout pass
//!   over the whole graph, with last-request-wins application
//! - **Serializable snapshots** - `{nodes, edges}` save/load via serde
//!
//! ## Quick Start
//!
//! ```
//! use flowgraph_core::{
//!     DragController, ConnectionSiteRegistry, GraphStore, KindRegistry, NodeKind, Point,
//! };
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let store = Rc::new(RefCell::new(GraphStore::new(Rc::new(
//!     KindRegistry::standard(),
//! ))));
//! let sites = Rc::new(RefCell::new(ConnectionSiteRegistry::new()));
//! let mut drag = DragController::new(Rc::clone(&store), Rc::clone(&sites));
//!
//! // Drag a swap action from the palette onto an empty canvas spot
//! drag.pointer_down(NodeKind::Swap, Point::new(400.0, 300.0));
//! drag.pointer_move(Point::new(420.0, 310.0));
//! let outcome = drag.drop().unwrap().unwrap();
//! assert!(store.borrow().node(outcome.node_id()).is_some());
//! ```
//!
//! ## Core Components
//!
//! - [`GraphStore`] - mutable node/edge container with CRUD, cascade
//!   deletes, atomic splice insertion, and subscriptions
//! - [`ConnectionSiteRegistry`] - open-handle tracking and proximity queries
//! - [`DragController`] - the palette-drag state machine
//! - [`layout`] - the layered layout engine
//! - [`KindRegistry`] - the closed node-kind catalog
//!
//! All state is shared explicitly (`Rc<RefCell<_>>`); the crate has no
//! global state and performs no I/O.

pub mod drag;
pub mod error;
pub mod layout;
pub mod node;
pub mod registry;
pub mod selection;
pub mod sites;
pub mod store;

// Re-export the main types
pub use drag::{DragController, DropOutcome, Viewport};
pub use error::{InvariantViolation, LayoutError, ValidationError};
pub use layout::{compute_for_store, compute_layout, Direction, LayoutConfig, NodePlacement};
pub use node::{Edge, EdgeId, Node, NodeFactory, NodeId, NodeStatus, Point, DEFAULT_HANDLE};
pub use registry::{HandleDirection, HandleSpec, KindRegistry, KindSpec, NodeKind};
pub use selection::SelectionSet;
pub use sites::{
    ConnectionSite, ConnectionSiteRegistry, PotentialConnection, ProximityQuery, SiteId,
    PROXIMITY_THRESHOLD,
};
pub use store::{
    EdgeChange, EdgeEnd, GraphSnapshot, GraphStore, LayoutMode, NodeChange, StoreSlice,
    SubscriberId,
};
