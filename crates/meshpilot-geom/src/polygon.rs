use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::predicates::{bounding_box, centroid, point_in_ring};
use crate::{Aabb, GeometryError, Result, Segment, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Layer assigned to polygons that don't name one.
pub const DEFAULT_LAYER: &str = "default";

#[derive(Debug, Clone, Default)]
struct DerivedCache {
    bbox: OnceLock<Aabb>,
    edges: OnceLock<Vec<Segment>>,
    centroid: OnceLock<Vec2>,
}

/// A walkable (or obstacle) area: a closed vertex ring plus layer and cost metadata.
///
/// Bounding box, edge list and centroid are derived lazily on first access and memoized until
/// the vertices change (`set_vertices`) or `invalidate_cache` is called.
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    layer: String,
    allowed_layers: BTreeSet<String>,
    traversal_cost: f64,
    slope_degrees: f64,
    cache: DerivedCache,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        validate_vertices(&vertices)?;
        Ok(Self {
            vertices,
            layer: DEFAULT_LAYER.to_string(),
            allowed_layers: BTreeSet::new(),
            traversal_cost: 1.0,
            slope_degrees: 0.0,
            cache: DerivedCache::default(),
        })
    }

    pub fn from_coords<I>(coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(coords.into_iter().map(Vec2::from).collect())
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    /// Extra layers this polygon may be traversed as, beyond its own `layer`.
    pub fn with_allowed_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_traversal_cost(mut self, cost: f64) -> Result<Self> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(GeometryError::InvalidTraversalCost { cost });
        }
        self.traversal_cost = cost;
        Ok(self)
    }

    pub fn with_slope(mut self, degrees: f64) -> Self {
        self.slope_degrees = degrees;
        self
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Own layer plus any explicitly allowed layers.
    pub fn allowed_layers(&self) -> BTreeSet<String> {
        let mut out = self.allowed_layers.clone();
        out.insert(self.layer.clone());
        out
    }

    pub fn traversal_cost(&self) -> f64 {
        self.traversal_cost
    }

    pub fn slope_degrees(&self) -> f64 {
        self.slope_degrees
    }

    /// Replace the vertex ring. Derived geometry is recomputed on next access.
    pub fn set_vertices(&mut self, vertices: Vec<Vec2>) -> Result<()> {
        validate_vertices(&vertices)?;
        self.vertices = vertices;
        self.invalidate_cache();
        Ok(())
    }

    pub fn invalidate_cache(&mut self) {
        self.cache = DerivedCache::default();
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.cache.bbox.get_or_init(|| {
            bounding_box(&self.vertices).unwrap_or(Aabb::new(0.0, 0.0, 0.0, 0.0))
        })
    }

    /// Consecutive vertex pairs, wrapping from the last vertex back to the first.
    pub fn edges(&self) -> &[Segment] {
        self.cache.edges.get_or_init(|| {
            let n = self.vertices.len();
            (0..n)
                .map(|i| Segment::new(self.vertices[i], self.vertices[(i + 1) % n]))
                .collect()
        })
    }

    /// Vertex mean (not the area centroid).
    pub fn centroid(&self) -> Vec2 {
        *self
            .cache
            .centroid
            .get_or_init(|| centroid(&self.vertices).unwrap_or(Vec2::ZERO))
    }

    /// Bounding-box width, used as the passage width of the polygon.
    pub fn width(&self) -> f64 {
        self.bounding_box().width()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        point_in_ring(&self.vertices, p)
    }

    pub fn has_layer(&self, layer: &str) -> bool {
        self.layer == layer || self.allowed_layers.contains(layer)
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.layer == other.layer
            && self.allowed_layers == other.allowed_layers
            && self.traversal_cost == other.traversal_cost
            && self.slope_degrees == other.slope_degrees
    }
}

fn validate_vertices(vertices: &[Vec2]) -> Result<()> {
    if vertices.len() < 3 {
        return Err(GeometryError::TooFewVertices {
            count: vertices.len(),
        });
    }
    if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(GeometryError::NonFiniteVertex { index });
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn default_layer() -> String {
    DEFAULT_LAYER.to_string()
}

#[cfg(feature = "serde")]
fn default_cost() -> f64 {
    1.0
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct PolygonSerde {
    vertices: Vec<Vec2>,
    #[serde(default = "default_layer")]
    layer: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    allowed_layers: BTreeSet<String>,
    #[serde(default = "default_cost")]
    traversal_cost: f64,
    #[serde(default)]
    slope_degrees: f64,
}

#[cfg(feature = "serde")]
impl Serialize for Polygon {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        PolygonSerde {
            vertices: self.vertices.clone(),
            layer: self.layer.clone(),
            allowed_layers: self.allowed_layers.clone(),
            traversal_cost: self.traversal_cost,
            slope_degrees: self.slope_degrees,
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Polygon {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = PolygonSerde::deserialize(deserializer)?;
        Polygon::new(data.vertices)
            .and_then(|p| p.with_traversal_cost(data.traversal_cost))
            .map(|p| {
                p.with_layer(data.layer)
                    .with_allowed_layers(data.allowed_layers)
                    .with_slope(data.slope_degrees)
            })
            .map_err(serde::de::Error::custom)
    }
}
