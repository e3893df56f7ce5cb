use std::fmt;
use std::sync::Arc;

use crate::predicates::{bbox_overlap, segments_intersect};
use crate::{Polygon, Vec2};

/// Pluggable segment-intersection routine.
///
/// Implementations must return exactly what [`segments_intersect`] returns for the same
/// input; an accelerated backend is a drop-in, never a behaviour change.
pub trait SegmentIntersector: Send + Sync {
    #[allow(clippy::too_many_arguments)]
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
    ) -> bool;

    fn name(&self) -> &str {
        "custom"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceIntersector;

impl SegmentIntersector for ReferenceIntersector {
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
        segments_intersect(
            Vec2::new(x1, y1),
            Vec2::new(x2, y2),
            Vec2::new(x3, y3),
            Vec2::new(x4, y4),
        )
    }

    fn name(&self) -> &str {
        "reference"
    }
}

/// Polygon-level predicates routed through a single [`SegmentIntersector`].
///
/// Adjacency and obstacle blocking both go through the same kernel so they can never
/// disagree about what "intersecting" means.
#[derive(Clone)]
pub struct GeometryKernel {
    backend: Arc<dyn SegmentIntersector>,
}

impl fmt::Debug for GeometryKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryKernel")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Default for GeometryKernel {
    fn default() -> Self {
        Self::reference()
    }
}

impl GeometryKernel {
    pub fn reference() -> Self {
        Self {
            backend: Arc::new(ReferenceIntersector),
        }
    }

    pub fn with_backend(backend: Arc<dyn SegmentIntersector>) -> Self {
        Self { backend }
    }

    /// Try to initialize an accelerated backend, falling back to the reference predicate when
    /// initialization fails.
    pub fn load<F, E>(init: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn SegmentIntersector>, E>,
        E: fmt::Display,
    {
        match init() {
            Ok(backend) => {
                tracing::debug!(backend = backend.name(), "Geometry backend loaded");
                Self { backend }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Geometry backend unavailable, using reference predicates");
                Self::reference()
            }
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn segments_intersect(&self, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
        self.backend
            .segments_intersect(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, p4.x, p4.y)
    }

    /// Two polygons are adjacent when their boxes overlap and at least one pair of their
    /// edges intersects (shared or touching boundary).
    pub fn polygons_adjacent(&self, a: &Polygon, b: &Polygon) -> bool {
        if !bbox_overlap(&a.bounding_box(), &b.bounding_box()) {
            return false;
        }
        a.edges().iter().any(|ea| {
            b.edges()
                .iter()
                .any(|eb| self.segments_intersect(ea.start, ea.end, eb.start, eb.end))
        })
    }

    /// Whether the segment `a -> b` is blocked by `obstacle`: it crosses one of the obstacle's
    /// edges, or either endpoint lies inside the obstacle.
    pub fn segment_blocked_by(&self, a: Vec2, b: Vec2, obstacle: &Polygon) -> bool {
        let seg_box = crate::Segment::new(a, b).bounding_box();
        if !bbox_overlap(&seg_box, &obstacle.bounding_box()) {
            return false;
        }
        if obstacle.contains_point(a) || obstacle.contains_point(b) {
            return true;
        }
        obstacle
            .edges()
            .iter()
            .any(|e| self.segments_intersect(a, b, e.start, e.end))
    }
}
