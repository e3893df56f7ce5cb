#![cfg(feature = "serde")]

mod common;

use meshpilot_nav::{
    AgentProfile, Algorithm, LayerConfig, NavMeshConfig, ObstacleConfig, PathQuery, PathResult,
};

#[test]
fn config_fills_omitted_fields_with_defaults() {
    let config: NavMeshConfig =
        serde_json::from_str(r#"{ "search": { "algorithm": "A*", "max_iterations": 50 } }"#)
            .expect("config");
    assert_eq!(config.search.algorithm, Algorithm::AStar);
    assert_eq!(config.search.max_iterations, 50);
    assert!(config.search.partial_path);
    assert!(!config.search.smooth_path);
    assert_eq!(config.obstacles, ObstacleConfig::default());

    let empty: NavMeshConfig = serde_json::from_str("{}").expect("empty config");
    assert_eq!(empty, NavMeshConfig::default());
}

#[test]
fn algorithms_use_lowercase_names() {
    assert_eq!(
        serde_json::to_string(&Algorithm::Dijkstra).expect("serialize"),
        r#""dijkstra""#
    );
    let parsed: Algorithm = serde_json::from_str(r#""astar""#).expect("astar");
    assert_eq!(parsed, Algorithm::AStar);
}

#[test]
fn profiles_and_layers_accept_partial_documents() {
    let profile: AgentProfile = serde_json::from_str(
        r#"{ "radius": 0.5, "min_path_width": 1.0, "terrain_costs": { "swamp": 3.0 } }"#,
    )
    .expect("profile");
    assert_eq!(profile.radius, 0.5);
    assert_eq!(profile.terrain_cost("swamp"), 3.0);
    assert_eq!(profile.max_slope, 45.0);
    assert!(profile.validate().is_ok());

    let layer: LayerConfig = serde_json::from_str(r##"{ "color": "#00ff00" }"##).expect("layer");
    assert_eq!(layer.traversal_cost, 1.0);
    assert_eq!(layer.image_id, None);
}

#[test]
fn path_results_round_trip() {
    let mesh = common::corridor(3);
    let result = PathQuery::new(mesh.graph().expect("built"), 0, 2)
        .run()
        .expect("path");
    let json = serde_json::to_string(&result).expect("serialize");
    let back: PathResult = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, result);
}
