//! End-to-end editing scenarios.
//!
//! Exercises the full palette-drag → store mutation → layout pipeline the
//! way an embedding application drives it.

use flowgraph_core::{
    compute_for_store, ConnectionSiteRegistry, DragController, DropOutcome, Edge, GraphStore,
    HandleDirection, KindRegistry, LayoutConfig, NodeKind, Point, ProximityQuery, StoreSlice,
};
use std::cell::RefCell;
use std::rc::Rc;

fn shared_store() -> Rc<RefCell<GraphStore>> {
    Rc::new(RefCell::new(GraphStore::new(Rc::new(
        KindRegistry::standard(),
    ))))
}

/// A trigger feeding a swap; removing the trigger leaves only the swap and
/// no edges.
#[test]
fn test_remove_trigger_cascades() {
    let store = shared_store();
    let mut store = store.borrow_mut();
    let trigger = store.add_node_by_type(NodeKind::Trigger, Point::new(200.0, 100.0));
    let swap = store.add_node_by_type(NodeKind::Swap, Point::new(200.0, 400.0));
    store.add_edge(Edge::between(trigger, Some("out"), swap, Some("in")));

    store.remove_node(trigger);

    assert_eq!(store.nodes().len(), 1);
    assert_eq!(store.nodes()[0].id, swap);
    assert!(store.edges().is_empty());
}

/// Building a three-step workflow entirely through palette drags: the first
/// drop places a trigger, each later drop lands near the previous node's
/// output and gets wired in automatically.
#[test]
fn test_chain_built_by_dragging() {
    let store = shared_store();
    let sites = Rc::new(RefCell::new(ConnectionSiteRegistry::new()));
    let mut drag = DragController::new(Rc::clone(&store), Rc::clone(&sites));

    drag.pointer_down(NodeKind::Trigger, Point::new(400.0, 100.0));
    let trigger = match drag.drop().unwrap().unwrap() {
        DropOutcome::Placed(id) => id,
        other => panic!("first drop should be standalone, got {other:?}"),
    };

    // The trigger's output handle sits at its bottom-center; drop the swap
    // slightly below it, inside the proximity threshold.
    let below_trigger = {
        let store = store.borrow();
        let node = store.node(trigger).unwrap();
        let handle = store
            .kinds()
            .spec(NodeKind::Trigger)
            .first_handle(HandleDirection::Source)
            .unwrap();
        node.position
            .offset(handle.offset.x, handle.offset.y + 100.0)
    };
    drag.pointer_down(NodeKind::Swap, below_trigger);
    drag.pointer_move(below_trigger);
    let swap = match drag.drop().unwrap().unwrap() {
        DropOutcome::Attached(id) => id,
        other => panic!("second drop should attach, got {other:?}"),
    };

    let below_swap = {
        let store = store.borrow();
        let node = store.node(swap).unwrap();
        node.position.offset(120.0, 120.0 + 90.0)
    };
    drag.pointer_down(NodeKind::Stake, below_swap);
    drag.pointer_move(below_swap);
    let stake = match drag.drop().unwrap().unwrap() {
        DropOutcome::Attached(id) => id,
        other => panic!("third drop should attach, got {other:?}"),
    };

    let store = store.borrow();
    assert_eq!(store.nodes().len(), 3);
    assert_eq!(store.edges().len(), 2);
    assert!(store
        .edges()
        .iter()
        .any(|e| e.source == trigger && e.target == swap));
    assert!(store
        .edges()
        .iter()
        .any(|e| e.source == swap && e.target == stake));
}

/// Splicing a node into an existing connection replaces the original edge
/// with exactly two edges through the new node.
#[test]
fn test_splice_into_existing_connection() {
    use flowgraph_core::EdgeEnd;

    let store = shared_store();
    let mut store = store.borrow_mut();
    let trigger = store.add_node_by_type(NodeKind::Trigger, Point::new(300.0, 100.0));
    let transfer = store.add_node_by_type(NodeKind::Transfer, Point::new(300.0, 700.0));
    store.add_edge(Edge::between(trigger, None, transfer, None));

    let swap = store
        .add_node_in_between(
            NodeKind::Swap,
            Some(EdgeEnd::new(trigger)),
            Some(EdgeEnd::new(transfer)),
            Point::new(300.0, 400.0),
        )
        .unwrap();

    assert_eq!(store.edges().len(), 2);
    assert!(store
        .edges()
        .iter()
        .any(|e| e.source == trigger && e.target == swap));
    assert!(store
        .edges()
        .iter()
        .any(|e| e.source == swap && e.target == transfer));
    assert!(!store
        .edges()
        .iter()
        .any(|e| e.source == trigger && e.target == transfer));

    // Node centered on the splice position
    let spec_width = store.kinds().spec(NodeKind::Swap).width;
    let node = store.node(swap).unwrap();
    assert_eq!(node.position.x, 300.0 - spec_width / 2.0);
}

/// The site registry can follow the store through a subscription, so open
/// handles always reflect current topology.
#[test]
fn test_registry_follows_store_via_subscription() {
    let store = shared_store();
    let sites = Rc::new(RefCell::new(ConnectionSiteRegistry::new()));

    {
        let sites = Rc::clone(&sites);
        store
            .borrow_mut()
            .subscribe(None, move |store, _slice| {
                sites
                    .borrow_mut()
                    .rebuild(store.nodes(), store.edges(), store.kinds());
            });
    }

    let (trigger, swap) = {
        let mut store = store.borrow_mut();
        let trigger = store.add_node_by_type(NodeKind::Trigger, Point::new(200.0, 100.0));
        let swap = store.add_node_by_type(NodeKind::Swap, Point::new(200.0, 400.0));
        (trigger, swap)
    };
    // trigger out + swap in + swap out
    assert_eq!(sites.borrow().len(), 3);

    store
        .borrow_mut()
        .add_edge(Edge::between(trigger, None, swap, None));
    // Both connected handles disappeared the instant the edge formed
    assert_eq!(sites.borrow().len(), 1);

    store.borrow_mut().remove_node(swap);
    // Cascade reopened the trigger's output
    assert_eq!(sites.borrow().len(), 1);
    let sites = sites.borrow();
    let remaining: Vec<_> = sites.sites().collect();
    assert_eq!(remaining[0].owner(), trigger);
}

/// Proximity queries never match a site of the query's own direction, and
/// the threshold is exclusive at exactly 150 units.
#[test]
fn test_proximity_direction_and_threshold() {
    let store = shared_store();
    let sites = Rc::new(RefCell::new(ConnectionSiteRegistry::new()));

    {
        let mut store = store.borrow_mut();
        store.add_node_by_type(NodeKind::Trigger, Point::new(500.0, 500.0));
    }
    let store = store.borrow();
    let mut registry = sites.borrow_mut();
    registry.rebuild(store.nodes(), store.edges(), store.kinds());

    // Trigger center (500,500), height 100 → "out" site at (500, 550)
    let site_pos = Point::new(500.0, 550.0);

    // Source-direction query cannot match the source site
    assert!(registry
        .check_for_potential_connection(
            site_pos,
            ProximityQuery {
                direction: Some(HandleDirection::Source),
                exclude: &[],
            },
        )
        .is_none());

    // Exactly on the threshold: no match; just inside: match
    assert!(registry
        .check_for_potential_connection(
            site_pos.offset(0.0, 150.0),
            ProximityQuery::default()
        )
        .is_none());
    assert!(registry
        .check_for_potential_connection(
            site_pos.offset(0.0, 149.5),
            ProximityQuery::default()
        )
        .is_some());
}

/// Running layout twice over an unchanged five-node chain reproduces the
/// same positions, with strictly increasing layer coordinates.
#[test]
fn test_layout_is_deterministic_over_store_chain() {
    let store = shared_store();
    let mut store = store.borrow_mut();

    let mut previous = None;
    for kind in [
        NodeKind::Trigger,
        NodeKind::Swap,
        NodeKind::Stake,
        NodeKind::Swap,
        NodeKind::Transfer,
    ] {
        let id = store.add_node_by_type(kind, Point::default());
        if let Some(prev) = previous {
            store.add_edge(Edge::between(prev, None, id, None));
        }
        previous = Some(id);
    }

    let first = compute_for_store(&store, &LayoutConfig::default()).unwrap();
    let second = compute_for_store(&store, &LayoutConfig::default()).unwrap();
    assert_eq!(first, second);

    let request = store.begin_layout_request();
    assert!(store.apply_layout(request, &first));

    let ys: Vec<f32> = store.nodes().iter().map(|n| n.position.y).collect();
    for pair in ys.windows(2) {
        assert!(pair[0] < pair[1], "chain layers must strictly increase");
    }
}

/// A layout that fails validation leaves every position untouched.
#[test]
fn test_failed_layout_preserves_positions() {
    use flowgraph_core::{compute_layout, NodeId};

    let store = shared_store();
    let mut store = store.borrow_mut();
    let id = store.add_node_by_type(NodeKind::Trigger, Point::new(123.0, 456.0));
    let before = store.node(id).unwrap().position;

    let bogus_edges = vec![(id, NodeId(9999))];
    let sizes = vec![(id, (240.0, 100.0))];
    assert!(compute_layout(&sizes, &bogus_edges, &LayoutConfig::default()).is_err());

    assert_eq!(store.node(id).unwrap().position, before);
}

/// Snapshots survive a serde round trip and keep editing usable afterwards.
#[test]
fn test_snapshot_save_load_continues_editing() {
    let store = shared_store();
    let snapshot_json = {
        let mut store = store.borrow_mut();
        let trigger = store.add_node_by_type(NodeKind::Trigger, Point::new(100.0, 100.0));
        let swap = store.add_node_by_type(NodeKind::Swap, Point::new(100.0, 400.0));
        store.add_edge(Edge::between(trigger, None, swap, None));
        serde_json::to_string(&store.snapshot()).unwrap()
    };

    let restored = shared_store();
    {
        let mut restored = restored.borrow_mut();
        restored
            .load_snapshot(serde_json::from_str(&snapshot_json).unwrap())
            .unwrap();
        assert_eq!(restored.nodes().len(), 2);
        assert_eq!(restored.edges().len(), 1);
    }

    // Editing continues with fresh, collision-free ids
    let sites = Rc::new(RefCell::new(ConnectionSiteRegistry::new()));
    let mut drag = DragController::new(Rc::clone(&restored), sites);
    drag.pointer_down(NodeKind::Transfer, Point::new(900.0, 900.0));
    let outcome = drag.drop().unwrap().unwrap();

    let restored = restored.borrow();
    assert_eq!(restored.nodes().len(), 3);
    let new_id = outcome.node_id();
    assert!(restored.nodes().iter().filter(|n| n.id == new_id).count() == 1);
}

/// Slice-filtered subscribers only hear about their slice.
#[test]
fn test_slice_filtered_subscription() {
    let store = shared_store();
    let events = Rc::new(RefCell::new(Vec::new()));

    {
        let events = Rc::clone(&events);
        store
            .borrow_mut()
            .subscribe(Some(StoreSlice::Edges), move |store, slice| {
                events.borrow_mut().push((slice, store.edges().len()));
            });
    }

    let mut store_mut = store.borrow_mut();
    let a = store_mut.add_node_by_type(NodeKind::Trigger, Point::default());
    let b = store_mut.add_node_by_type(NodeKind::Swap, Point::default());
    store_mut.toggle_layout_mode();
    assert!(events.borrow().is_empty());

    store_mut.add_edge(Edge::between(a, None, b, None));
    drop(store_mut);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], (StoreSlice::Edges, 1));
}
