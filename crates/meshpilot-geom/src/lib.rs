//! 2-D geometry primitives for meshpilot: vectors, bounding boxes, segment predicates and
//! walkable polygons.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod math;
pub mod polygon;
pub mod predicates;

pub use backend::{GeometryKernel, ReferenceIntersector, SegmentIntersector};
pub use error::{GeometryError, Result};
pub use math::{Aabb, Segment, Vec2};
pub use polygon::{Polygon, DEFAULT_LAYER};
pub use predicates::{
    bbox_overlap, bounding_box, centroid, orientation, point_in_ring, point_on_segment,
    segments_intersect, EPSILON,
};
