mod common;

use common::{rect, three_triangles, tri};
use meshpilot_nav::{LayerConfig, NavError, NavEvent, NavMesh, Polygon};

#[test]
fn adjacency_follows_shared_edges_and_touching_vertices() {
    let mut mesh = three_triangles();
    let graph = mesh.build_graph();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.has_edge(0, 1), "A and B touch at (5,0)");
    assert!(graph.has_edge(1, 2), "B and C share an edge");
    assert!(!graph.has_edge(0, 2));
}

#[test]
fn edges_are_symmetric_and_weighted_by_centroid_distance() {
    let mut mesh = three_triangles();
    let graph = mesh.build_graph().clone();

    for node in graph.nodes() {
        for edge in graph.neighbors(node.id) {
            let back = graph.edge(edge.to, edge.from).expect("reverse edge");
            assert_eq!(back.weight, edge.weight);

            let a = graph.node(edge.from).expect("from").centroid();
            let b = graph.node(edge.to).expect("to").centroid();
            assert!((edge.weight - a.distance(b)).abs() < 1e-12);
        }
    }
}

#[test]
fn obstacle_aware_build_drops_blocked_edges() {
    let mut mesh = three_triangles();
    let obstacle = rect(4.0, 1.0, 6.0, 3.0);
    let graph = mesh.build_graph_considering_obstacles(&[obstacle]);

    assert_eq!(graph.neighbors(0).len(), 0);
    assert_eq!(graph.neighbors(1).len(), 1);
    assert_eq!(graph.neighbors(1)[0].to, 2);
    assert_eq!(graph.neighbors(2).len(), 1);
    assert_eq!(graph.neighbors(2)[0].to, 1);
}

#[test]
fn rebuilding_an_unchanged_mesh_is_idempotent() {
    let mut mesh = three_triangles();
    let first = mesh.build_graph().clone();
    let second = mesh.build_graph().clone();
    assert_eq!(first, second);
    assert_eq!(first.adjacency_snapshot(), second.adjacency_snapshot());
}

#[test]
fn polygons_on_unregistered_layers_are_rejected() {
    let mut mesh = NavMesh::new();
    let log = common::record(mesh.events_mut());

    let water = tri([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).with_layer("water");
    let err = mesh.add_polygon(water.clone()).expect_err("water not registered");
    assert_eq!(
        err,
        NavError::UnregisteredLayer {
            layer: "water".to_string()
        }
    );
    assert!(mesh.polygons().is_empty());

    mesh.register_layer("water", LayerConfig::default())
        .expect("register water");
    assert_eq!(mesh.add_polygon(water).expect("now accepted"), 0);

    let events = log.lock().expect("log");
    assert!(matches!(
        events[0],
        NavEvent::Error {
            operation: "add_polygon",
            ..
        }
    ));
    assert!(matches!(&events[1], NavEvent::LayerRegistered { name } if name == "water"));
    assert!(matches!(&events[2], NavEvent::PolygonAdded { node: 0, layer } if layer == "water"));
}

#[test]
fn build_emits_graph_built_with_counts() {
    let mut mesh = three_triangles();
    let log = common::record(mesh.events_mut());
    mesh.build_graph();
    mesh.build_graph_considering_obstacles(&[rect(4.0, 1.0, 6.0, 3.0)]);

    let events = log.lock().expect("log");
    assert_eq!(
        events.as_slice(),
        &[
            NavEvent::GraphBuilt {
                nodes: 3,
                edges: 2,
                obstacle_aware: false
            },
            NavEvent::GraphBuilt {
                nodes: 3,
                edges: 1,
                obstacle_aware: true
            },
        ]
    );
}

#[test]
fn graph_edits_keep_adjacency_sorted() {
    let mut mesh = common::grid(3, 1);
    let mut graph = mesh.build_graph().clone();
    let before = graph.adjacency_snapshot();

    let weight = graph.remove_edge(1, 0).expect("edge exists");
    assert!(!graph.has_edge(0, 1));
    assert_eq!(graph.remove_edge(0, 1), None);
    assert!(graph.add_edge(0, 1, weight));
    assert_eq!(graph.adjacency_snapshot(), before);

    assert!(!graph.add_edge(0, 0, 1.0), "self loops are rejected");
    assert!(!graph.add_edge(0, 99, 1.0), "unknown endpoints are rejected");
}

#[test]
fn non_adjacent_polygons_leave_isolated_nodes() {
    let mut mesh = NavMesh::new();
    mesh.add_polygon(rect(0.0, 0.0, 1.0, 1.0)).expect("a");
    mesh.add_polygon(rect(5.0, 5.0, 6.0, 6.0)).expect("b");
    let graph = mesh.build_graph();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn polygon_nodes_share_the_mesh_polygons() {
    let mut mesh = three_triangles();
    let graph = mesh.build_graph().clone();
    let node = graph.node(1).expect("node 1");
    let polygon: &Polygon = mesh.polygon(1).expect("polygon 1");
    assert_eq!(node.polygon.as_ref(), polygon);
    assert_eq!(node.traversal_cost, 1.0);
}
