mod common;

use std::sync::Arc;

use common::{corridor, grid, hypotenuse_pair, rect};
use meshpilot_nav::{
    find_path, Algorithm, Graph, GraphNode, NavError, NavEvent, NavMesh, PathEndpoint, PathQuery,
    Termination, Vec2,
};
use proptest::prelude::*;

#[test]
fn points_resolve_to_nearest_nodes_across_a_shared_hypotenuse() {
    let mut mesh = hypotenuse_pair();
    let result = mesh
        .find_path(Vec2::new(1.0, 1.0), Vec2::new(9.0, 9.0))
        .expect("path");

    assert_eq!(result.nodes, vec![0, 1]);
    assert!(result.complete);
    assert_eq!(result.termination, Termination::GoalReached);
    assert_eq!(result.points.len(), 2);
    let expected = result.points[0].distance(result.points[1]);
    assert!((result.distance - expected).abs() < 1e-12);
}

#[test]
fn every_algorithm_walks_a_corridor() {
    let mesh = corridor(5);
    let graph = mesh.graph().expect("built");
    for algorithm in [
        Algorithm::AStar,
        Algorithm::Dijkstra,
        Algorithm::Bfs,
        Algorithm::Dfs,
    ] {
        let result = PathQuery::new(graph, 0, 4)
            .algorithm(algorithm)
            .run()
            .expect("path");
        assert_eq!(result.nodes, vec![0, 1, 2, 3, 4], "{algorithm}");
        assert!(result.complete);
        assert!((result.distance - 8.0).abs() < 1e-12);
    }
}

#[test]
fn astar_takes_the_diagonal_across_a_grid() {
    let mesh = grid(3, 3);
    let graph = mesh.graph().expect("built");
    let result = PathQuery::new(graph, 0, 8).run().expect("path");
    assert_eq!(result.nodes, vec![0, 4, 8]);
    assert!((result.distance - 4.0 * 2f64.sqrt()).abs() < 1e-9);
}

#[test]
fn unreachable_goal_yields_a_partial_path_or_nothing() {
    let mut mesh = NavMesh::new();
    for i in 0..3 {
        let x = 2.0 * i as f64;
        mesh.add_polygon(rect(x, 0.0, x + 2.0, 2.0)).expect("square");
    }
    mesh.add_polygon(rect(20.0, 0.0, 22.0, 2.0)).expect("island");
    mesh.build_graph();
    let graph = mesh.graph().expect("built");

    let partial = PathQuery::new(graph, 0, 3).run().expect("partial");
    assert_eq!(partial.nodes, vec![0, 1, 2]);
    assert!(!partial.complete);
    assert_eq!(partial.termination, Termination::FrontierExhausted);

    let none = PathQuery::new(graph, 0, 3)
        .partial_path(false)
        .run()
        .expect("empty");
    assert!(none.is_empty());
    assert!(!none.complete);
    assert_eq!(none.distance, 0.0);
}

#[test]
fn iteration_cap_stops_the_search() {
    let mesh = corridor(10);
    let graph = mesh.graph().expect("built");

    let capped = PathQuery::new(graph, 0, 9)
        .max_iterations(3)
        .run()
        .expect("capped");
    assert_eq!(capped.termination, Termination::IterationLimit);
    assert_eq!(capped.iterations, 3);
    assert_eq!(capped.nodes, vec![0, 1, 2]);
    assert!(!capped.complete);

    let zero = PathQuery::new(graph, 0, 9)
        .max_iterations(0)
        .run()
        .expect("zero budget");
    assert_eq!(zero.nodes, vec![0]);
    assert_eq!(zero.iterations, 0);
}

#[test]
fn start_equal_to_goal_is_a_single_node_path() {
    let mesh = corridor(3);
    let graph = mesh.graph().expect("built");
    let result = PathQuery::new(graph, 1, 1).run().expect("trivial");
    assert_eq!(result.nodes, vec![1]);
    assert!(result.complete);
    assert_eq!(result.distance, 0.0);
    assert_eq!(result.iterations, 1);
}

#[test]
fn unresolvable_endpoints_are_errors() {
    let mesh = corridor(2);
    let graph = mesh.graph().expect("built");
    let err = PathQuery::new(graph, 7, 0).run().expect_err("missing start");
    assert!(matches!(err, NavError::NodeResolution { which: "start", .. }));

    let err = PathQuery::new(graph, 0, Vec2::new(f64::NAN, 0.0))
        .run()
        .expect_err("NaN goal");
    assert!(matches!(err, NavError::NodeResolution { which: "end", .. }));

    let empty = Graph::new();
    let err = find_path(&PathQuery::new(&empty, Vec2::ZERO, Vec2::ZERO)).expect_err("empty");
    assert!(matches!(err, NavError::NodeResolution { .. }));
}

#[test]
fn algorithm_names_parse_case_insensitively() {
    assert_eq!("A*".parse::<Algorithm>().expect("a*"), Algorithm::AStar);
    assert_eq!("astar".parse::<Algorithm>().expect("astar"), Algorithm::AStar);
    assert_eq!("Dijkstra".parse::<Algorithm>().expect("dijkstra"), Algorithm::Dijkstra);
    assert_eq!("BFS".parse::<Algorithm>().expect("bfs"), Algorithm::Bfs);
    assert_eq!(" dfs ".parse::<Algorithm>().expect("dfs"), Algorithm::Dfs);
    assert_eq!(
        "greedy".parse::<Algorithm>().expect_err("unknown"),
        NavError::UnknownAlgorithm {
            name: "greedy".to_string()
        }
    );
}

#[test]
fn validator_rejections_route_around_nodes() {
    let mesh = grid(3, 3);
    let graph = mesh.graph().expect("built");

    let result = PathQuery::new(graph, 0, 8)
        .validator(|edge, _| edge.to != 4)
        .run()
        .expect("detour");
    assert!(result.complete);
    assert!(!result.nodes.contains(&4));

    let walled = corridor(3);
    let result = PathQuery::new(walled.graph().expect("built"), 0, 2)
        .validator(|edge, _| edge.to != 1)
        .run()
        .expect("partial");
    assert_eq!(result.nodes, vec![0]);
    assert!(!result.complete);
}

#[test]
fn custom_cost_steers_away_from_diagonals() {
    let mesh = grid(3, 3);
    let graph = mesh.graph().expect("built");
    let result = PathQuery::new(graph, 0, 8)
        .cost_fn(|edge| if edge.weight > 2.5 { 100.0 } else { edge.weight })
        .run()
        .expect("path");

    assert_eq!(result.nodes.len(), 5);
    for pair in result.points.windows(2) {
        assert!((pair[0].distance(pair[1]) - 2.0).abs() < 1e-9, "orthogonal step");
    }
}

#[test]
fn smoothing_shortcuts_through_direct_edges() {
    let mesh = grid(3, 3);
    let graph = mesh.graph().expect("built");
    let orthogonal = |edge: &meshpilot_nav::GraphEdge| {
        if edge.weight > 2.5 {
            100.0
        } else {
            edge.weight
        }
    };

    let raw = PathQuery::new(graph, 0, 8)
        .cost_fn(orthogonal)
        .run()
        .expect("raw");
    let smooth = PathQuery::new(graph, 0, 8)
        .cost_fn(orthogonal)
        .smooth_path(true)
        .run()
        .expect("smooth");

    assert!(smooth.nodes.len() < raw.nodes.len());
    assert_eq!(smooth.nodes.first(), raw.nodes.first());
    assert_eq!(smooth.nodes.last(), raw.nodes.last());
    assert!(smooth.complete);
    assert!(smooth.nodes.windows(2).all(|w| graph.has_edge(w[0], w[1])));
    let mut raw_iter = raw.nodes.iter();
    assert!(
        smooth.nodes.iter().all(|n| raw_iter.any(|r| r == n)),
        "smoothed path is a subsequence of the raw path"
    );
}

#[test]
fn searches_are_deterministic() {
    let mesh = grid(4, 4);
    let graph = mesh.graph().expect("built");
    for algorithm in [Algorithm::AStar, Algorithm::Bfs, Algorithm::Dfs] {
        let a = PathQuery::new(graph, 0, 15).algorithm(algorithm).run().expect("a");
        let b = PathQuery::new(graph, 0, 15).algorithm(algorithm).run().expect("b");
        assert_eq!(a, b);
    }
}

#[test]
fn queries_work_on_hand_built_graphs() {
    let square = Arc::new(rect(0.0, 0.0, 1.0, 1.0));
    let mut graph = Graph::new();
    for id in 0..4 {
        graph.add_node(GraphNode::new(id, Arc::clone(&square)));
    }
    graph.add_edge(0, 1, 1.0);
    graph.add_edge(1, 3, 1.0);
    graph.add_edge(0, 2, 0.5);
    graph.add_edge(2, 3, 0.5);

    let result = PathQuery::new(&graph, 0, 3)
        .algorithm(Algorithm::Dijkstra)
        .run()
        .expect("path");
    assert_eq!(result.nodes, vec![0, 2, 3]);
}

#[test]
fn mesh_queries_report_on_the_event_bus() {
    let mut mesh = NavMesh::new();
    let log = common::record(mesh.events_mut());
    assert_eq!(mesh.find_path(0, 1).expect_err("no graph"), NavError::GraphNotBuilt);

    for i in 0..2 {
        let x = 2.0 * i as f64;
        mesh.add_polygon(rect(x, 0.0, x + 2.0, 2.0)).expect("square");
    }
    mesh.add_polygon(rect(20.0, 0.0, 22.0, 2.0)).expect("island");
    mesh.build_graph();
    log.lock().expect("log").clear();

    mesh.find_path(0, 1).expect("found");
    mesh.find_path_with(0, 2, |q| q.partial_path(false))
        .expect("blocked");

    let events = log.lock().expect("log");
    assert_eq!(
        events.as_slice(),
        &[
            NavEvent::PathRequested {
                start: PathEndpoint::Node(0),
                end: PathEndpoint::Node(1)
            },
            NavEvent::PathFound {
                nodes: vec![0, 1],
                complete: true
            },
            NavEvent::PathRequested {
                start: PathEndpoint::Node(0),
                end: PathEndpoint::Node(2)
            },
            NavEvent::PathBlocked {
                start: PathEndpoint::Node(0),
                end: PathEndpoint::Node(2)
            },
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn astar_and_dijkstra_agree_on_optimal_distance(start in 0usize..16, goal in 0usize..16) {
        let mesh = grid(4, 4);
        let graph = mesh.graph().expect("built");
        let astar = PathQuery::new(graph, start, goal).run().expect("a*");
        let dijkstra = PathQuery::new(graph, start, goal)
            .algorithm(Algorithm::Dijkstra)
            .run()
            .expect("dijkstra");
        let bfs = PathQuery::new(graph, start, goal)
            .algorithm(Algorithm::Bfs)
            .run()
            .expect("bfs");

        prop_assert!(astar.complete && dijkstra.complete && bfs.complete);
        prop_assert!((astar.distance - dijkstra.distance).abs() < 1e-9);
        prop_assert!(astar.distance <= bfs.distance + 1e-9);
        prop_assert!(astar.nodes.windows(2).all(|w| graph.has_edge(w[0], w[1])));
    }
}
