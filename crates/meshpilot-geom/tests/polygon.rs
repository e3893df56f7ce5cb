use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meshpilot_geom::{
    bounding_box, Aabb, GeometryError, GeometryKernel, Polygon, ReferenceIntersector,
    SegmentIntersector, Vec2, DEFAULT_LAYER,
};

#[test]
fn polygon_rejects_malformed_vertices() {
    let err = Polygon::from_coords([(0.0, 0.0), (1.0, 0.0)]).expect_err("two vertices");
    assert_eq!(err, GeometryError::TooFewVertices { count: 2 });

    let err = Polygon::from_coords([(0.0, 0.0), (f64::NAN, 0.0), (0.0, 1.0)])
        .expect_err("NaN vertex");
    assert_eq!(err, GeometryError::NonFiniteVertex { index: 1 });

    let err = Polygon::from_coords([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])
        .expect("triangle")
        .with_traversal_cost(-1.0)
        .expect_err("negative cost");
    assert_eq!(err, GeometryError::InvalidTraversalCost { cost: -1.0 });
}

#[test]
fn polygon_defaults_to_default_layer() {
    let poly = Polygon::from_coords([(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).expect("triangle");
    assert_eq!(poly.layer(), DEFAULT_LAYER);
    assert_eq!(poly.traversal_cost(), 1.0);
    assert!(poly.has_layer(DEFAULT_LAYER));
    assert!(!poly.has_layer("water"));

    let shallows = poly.with_layer("sand").with_allowed_layers(["water"]);
    assert!(shallows.has_layer("sand"));
    assert!(shallows.has_layer("water"));
    assert_eq!(shallows.allowed_layers().len(), 2);
}

#[test]
fn derived_geometry_is_consistent_with_vertices() {
    let tri = Polygon::from_coords([(0.0, 0.0), (5.0, 0.0), (0.0, 5.0)]).expect("triangle");

    let bbox = tri.bounding_box();
    assert_eq!((bbox.xmin, bbox.xmax, bbox.ymin, bbox.ymax), (0.0, 5.0, 0.0, 5.0));
    assert_eq!(tri.width(), 5.0);

    let edges = tri.edges();
    assert_eq!(edges.len(), 3);
    assert_eq!(edges[2].start, Vec2::new(0.0, 5.0));
    assert_eq!(edges[2].end, Vec2::new(0.0, 0.0), "last edge wraps to the first vertex");

    let c = tri.centroid();
    assert!((c.x - 5.0 / 3.0).abs() < 1e-12);
    assert!((c.y - 5.0 / 3.0).abs() < 1e-12);
}

#[test]
fn polygon_bounds_agree_with_the_free_predicate() {
    let ring = [(-2.0, 1.0), (4.0, -3.0), (5.0, 2.5), (0.5, 6.0)];
    let poly = Polygon::from_coords(ring).expect("quad");
    let expected = bounding_box(poly.vertices()).expect("non-empty ring");
    assert_eq!(poly.bounding_box(), expected);
    assert_eq!(expected, Aabb::new(-2.0, 5.0, -3.0, 6.0));
    assert_eq!(poly.width(), 7.0);
}

#[test]
fn set_vertices_invalidates_cached_geometry() {
    let mut poly = Polygon::from_coords([(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)]).expect("triangle");
    assert_eq!(poly.centroid(), Vec2::new(1.0, 1.0));
    assert_eq!(poly.bounding_box().xmax, 3.0);

    poly.set_vertices(vec![
        Vec2::new(10.0, 10.0),
        Vec2::new(16.0, 10.0),
        Vec2::new(10.0, 16.0),
    ])
    .expect("valid ring");
    assert_eq!(poly.centroid(), Vec2::new(12.0, 12.0));
    assert_eq!(poly.bounding_box().xmax, 16.0);
    assert_eq!(poly.edges()[0].start, Vec2::new(10.0, 10.0));

    assert!(poly.set_vertices(vec![Vec2::ZERO]).is_err());
    assert_eq!(poly.vertex_count(), 3, "rejected update leaves the polygon untouched");
}

#[test]
fn kernel_detects_shared_hypotenuse_adjacency() {
    let kernel = GeometryKernel::reference();
    let a = Polygon::from_coords([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]).expect("a");
    let b = Polygon::from_coords([(10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).expect("b");
    let far = Polygon::from_coords([(20.0, 20.0), (30.0, 20.0), (20.0, 30.0)]).expect("far");

    assert!(kernel.polygons_adjacent(&a, &b));
    assert!(kernel.polygons_adjacent(&b, &a));
    assert!(!kernel.polygons_adjacent(&a, &far));
}

#[test]
fn kernel_blocks_segments_crossing_or_starting_inside_obstacles() {
    let kernel = GeometryKernel::reference();
    let obstacle = Polygon::from_coords([(4.0, 1.0), (6.0, 1.0), (6.0, 3.0), (4.0, 3.0)])
        .expect("rectangle");

    assert!(kernel.segment_blocked_by(Vec2::new(0.0, 2.0), Vec2::new(10.0, 2.0), &obstacle));
    assert!(kernel.segment_blocked_by(Vec2::new(5.0, 2.0), Vec2::new(5.5, 2.5), &obstacle));
    assert!(!kernel.segment_blocked_by(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0), &obstacle));
}

struct CountingIntersector {
    calls: Arc<AtomicUsize>,
}

impl SegmentIntersector for CountingIntersector {
    fn segments_intersect(
        &self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        ReferenceIntersector.segments_intersect(x1, y1, x2, y2, x3, y3, x4, y4)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[test]
fn kernel_routes_through_loaded_backend() {
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = CountingIntersector {
        calls: Arc::clone(&calls),
    };
    let kernel = GeometryKernel::load(|| {
        Ok::<Arc<dyn SegmentIntersector>, String>(Arc::new(backend))
    });
    assert_eq!(kernel.backend_name(), "counting");

    let a = Polygon::from_coords([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]).expect("a");
    let b = Polygon::from_coords([(10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).expect("b");
    assert!(kernel.polygons_adjacent(&a, &b));
    assert!(calls.load(Ordering::Relaxed) > 0);
}

#[test]
fn kernel_falls_back_to_reference_when_backend_fails() {
    let kernel = GeometryKernel::load(|| {
        Err::<Arc<dyn SegmentIntersector>, _>("accelerated module missing")
    });
    assert_eq!(kernel.backend_name(), "reference");
    assert!(kernel.segments_intersect(
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 2.0),
        Vec2::new(0.0, 2.0),
        Vec2::new(2.0, 0.0),
    ));
}
