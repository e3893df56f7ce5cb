#![cfg(feature = "serde")]

use meshpilot_geom::{Polygon, Vec2};

#[test]
fn polygon_roundtrips_via_serde() {
    let poly = Polygon::from_coords([(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)])
        .expect("rectangle")
        .with_layer("mud")
        .with_allowed_layers(["default"])
        .with_traversal_cost(2.5)
        .expect("cost")
        .with_slope(12.0);

    let json = serde_json::to_string(&poly).expect("serialize polygon");
    let back: Polygon = serde_json::from_str(&json).expect("deserialize polygon");

    assert_eq!(poly, back);
    assert_eq!(back.centroid(), Vec2::new(2.0, 1.0));
}

#[test]
fn polygon_deserialization_applies_defaults_and_validation() {
    let poly: Polygon = serde_json::from_str(
        r#"{"vertices":[{"x":0.0,"y":0.0},{"x":1.0,"y":0.0},{"x":0.0,"y":1.0}]}"#,
    )
    .expect("minimal polygon");
    assert_eq!(poly.layer(), "default");
    assert_eq!(poly.traversal_cost(), 1.0);

    let err = serde_json::from_str::<Polygon>(r#"{"vertices":[{"x":0.0,"y":0.0}]}"#);
    assert!(err.is_err(), "a single vertex is not a polygon");
}
