//! Reference geometry predicates.
//!
//! These are pure functions. `segments_intersect` is the single intersection rule used by
//! polygon adjacency and obstacle blocking; accelerated backends must agree with it.

use crate::{Aabb, Vec2};

/// Tolerance applied to orientation tests.
pub const EPSILON: f64 = 1e-9;

/// Signed area of the parallelogram spanned by `b - a` and `c - a`.
///
/// Positive when `c` lies to the left of the directed line `a -> b`.
pub fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).cross(c - a)
}

/// Whether `p` lies inside the bounding box of segment `a -> b`.
///
/// Only meaningful once `p` is known to be collinear with the segment.
pub fn point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed-segment intersection test for `p1 -> p2` against `p3 -> p4`.
///
/// Touching endpoints and collinear overlap both count as intersecting.
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    let d1 = orientation(p3, p4, p1);
    let d2 = orientation(p3, p4, p2);
    let d3 = orientation(p1, p2, p3);
    let d4 = orientation(p1, p2, p4);

    let straddles = |a: f64, b: f64| (a > EPSILON && b < -EPSILON) || (a < -EPSILON && b > EPSILON);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1.abs() < EPSILON && point_on_segment(p3, p4, p1))
        || (d2.abs() < EPSILON && point_on_segment(p3, p4, p2))
        || (d3.abs() < EPSILON && point_on_segment(p1, p2, p3))
        || (d4.abs() < EPSILON && point_on_segment(p1, p2, p4))
}

/// True unless one box lies strictly to one side of the other.
pub fn bbox_overlap(a: &Aabb, b: &Aabb) -> bool {
    !(a.xmax < b.xmin || b.xmax < a.xmin || a.ymax < b.ymin || b.ymax < a.ymin)
}

/// Ray-casting parity test of `p` against the closed ring `vertices`.
///
/// Points exactly on the boundary may land on either side.
pub fn point_in_ring(vertices: &[Vec2], p: Vec2) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];
        // Guard against division by zero on horizontal edges.
        let denom = vj.y - vi.y + EPSILON;
        let crosses = (vi.y > p.y) != (vj.y > p.y)
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / denom + vi.x;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn bounding_box(vertices: &[Vec2]) -> Option<Aabb> {
    Aabb::from_points(vertices.iter().copied())
}

/// Arithmetic mean of the vertices.
pub fn centroid(vertices: &[Vec2]) -> Option<Vec2> {
    if vertices.is_empty() {
        return None;
    }
    let sum = vertices.iter().fold(Vec2::ZERO, |acc, v| acc + *v);
    Some(sum / vertices.len() as f64)
}
