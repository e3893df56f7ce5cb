//! Incremental edge blocking for obstacles that appear and disappear after the graph is built.
//!
//! Every undirected graph edge is indexed once as the segment between its endpoint
//! centroids, owned by the lower node id. Adding an obstacle only tests the edges whose
//! grid cells overlap the obstacle's bounding box. Coverage is tracked per edge, so an
//! edge blocked by several obstacles is restored only when the last of them is removed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use meshpilot_geom::{GeometryKernel, Polygon, Segment, Vec2};
use uuid::Uuid;

use crate::config::ObstacleConfig;
use crate::events::{EventBus, NavEvent};
use crate::graph::{Graph, NodeId};
use crate::spatial::SpatialGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstacleId(Uuid);

impl ObstacleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObstacleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of an indexed edge: owning node plus exact endpoint coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId {
    node: NodeId,
    start: (u64, u64),
    end: (u64, u64),
}

impl EdgeId {
    pub fn new(node: NodeId, segment: Segment) -> Self {
        Self {
            node,
            start: segment.start.to_bits(),
            end: segment.end.to_bits(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn start(&self) -> Vec2 {
        Vec2::new(f64::from_bits(self.start.0), f64::from_bits(self.start.1))
    }

    pub fn end(&self) -> Vec2 {
        Vec2::new(f64::from_bits(self.end.0), f64::from_bits(self.end.1))
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, e) = (self.start(), self.end());
        write!(f, "{}_{},{}_{},{}", self.node, s.x, s.y, e.x, e.y)
    }
}

/// A graph edge as seen by the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Weight the edge carried when indexed; used when restoring it.
    pub weight: f64,
    pub segment: Segment,
}

#[derive(Debug)]
pub struct DynamicObstacleManager {
    config: ObstacleConfig,
    kernel: GeometryKernel,
    obstacles: BTreeMap<ObstacleId, Polygon>,
    grid: SpatialGrid<IndexedEdge>,
    by_id: BTreeMap<EdgeId, usize>,
    by_pair: BTreeMap<(NodeId, NodeId), EdgeId>,
    /// Obstacles currently blocking each edge.
    coverage: BTreeMap<EdgeId, BTreeSet<ObstacleId>>,
    /// Edges each obstacle blocks; the inverse of `coverage`.
    blocks: BTreeMap<ObstacleId, BTreeSet<EdgeId>>,
    events: EventBus,
}

impl Default for DynamicObstacleManager {
    fn default() -> Self {
        Self::new(ObstacleConfig::default(), GeometryKernel::default())
    }
}

impl DynamicObstacleManager {
    pub fn new(config: ObstacleConfig, kernel: GeometryKernel) -> Self {
        let grid = SpatialGrid::new(config.cell_size);
        Self {
            config,
            kernel,
            obstacles: BTreeMap::new(),
            grid,
            by_id: BTreeMap::new(),
            by_pair: BTreeMap::new(),
            coverage: BTreeMap::new(),
            blocks: BTreeMap::new(),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &ObstacleConfig {
        &self.config
    }

    /// Bus carrying obstacle-added / obstacle-removed notifications.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Rebuilds the edge index from `graph` and re-applies every active obstacle to it.
    pub fn reindex(&mut self, graph: &mut Graph) {
        self.grid = SpatialGrid::new(self.config.cell_size);
        self.by_id.clear();
        self.by_pair.clear();
        self.coverage.clear();
        self.blocks.clear();

        for edge in graph.edges() {
            let (Some(a), Some(b)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            let segment = Segment::new(a.centroid(), b.centroid());
            let id = EdgeId::new(edge.from, segment);
            let index = self.grid.insert(
                &segment.bounding_box(),
                IndexedEdge {
                    id,
                    from: edge.from,
                    to: edge.to,
                    weight: edge.weight,
                    segment,
                },
            );
            self.by_id.insert(id, index);
            self.by_pair.insert((edge.from, edge.to), id);
        }

        let ids: Vec<ObstacleId> = self.obstacles.keys().copied().collect();
        for id in ids {
            let blocked = self.blocked_by(&self.obstacles[&id]);
            for edge in &blocked {
                self.coverage.entry(*edge).or_default().insert(id);
            }
            self.blocks.insert(id, blocked);
        }
        if self.config.auto_update {
            self.apply_blocked_edges(graph);
        }
        tracing::debug!(
            edges = self.grid.len(),
            cells = self.grid.occupied_cells(),
            obstacles = self.obstacles.len(),
            "indexed graph edges"
        );
    }

    /// Indexed edges whose centroid segment is blocked by `obstacle`.
    pub fn blocked_by(&self, obstacle: &Polygon) -> BTreeSet<EdgeId> {
        self.grid
            .query(&obstacle.bounding_box())
            .into_iter()
            .filter(|e| {
                self.kernel
                    .segment_blocked_by(e.segment.start, e.segment.end, obstacle)
            })
            .map(|e| e.id)
            .collect()
    }

    /// Registers `obstacle` under a fresh id. The edges it newly blocked are announced
    /// on the manager's event bus.
    pub fn add_obstacle(&mut self, graph: &mut Graph, obstacle: Polygon) -> ObstacleId {
        let id = ObstacleId::new();
        self.insert_obstacle(graph, id, obstacle);
        id
    }

    fn insert_obstacle(&mut self, graph: &mut Graph, id: ObstacleId, obstacle: Polygon) {
        let blocked = self.blocked_by(&obstacle);
        let mut newly_blocked = Vec::new();
        for edge in &blocked {
            let covering = self.coverage.entry(*edge).or_default();
            if covering.is_empty() {
                newly_blocked.push(*edge);
            }
            covering.insert(id);
        }
        self.blocks.insert(id, blocked);
        self.obstacles.insert(id, obstacle);

        if self.config.auto_update {
            for edge in &newly_blocked {
                if let Some(indexed) = self.indexed(edge) {
                    graph.remove_edge(indexed.from, indexed.to);
                }
            }
        }
        tracing::debug!(obstacle = %id, blocked = newly_blocked.len(), "obstacle added");
        self.events.emit(NavEvent::ObstacleAdded {
            id,
            blocked_edges: newly_blocked,
        });
    }

    /// Removes an obstacle and returns the edges that are no longer blocked by anything.
    ///
    /// Unknown ids are a no-op and return `None`.
    pub fn remove_obstacle(&mut self, graph: &mut Graph, id: ObstacleId) -> Option<Vec<EdgeId>> {
        self.obstacles.remove(&id)?;
        let covered = self.blocks.remove(&id).unwrap_or_default();

        let mut unblocked = Vec::new();
        for edge in covered {
            let Some(owners) = self.coverage.get_mut(&edge) else {
                continue;
            };
            owners.remove(&id);
            if owners.is_empty() {
                self.coverage.remove(&edge);
                unblocked.push(edge);
            }
        }

        if self.config.auto_update {
            for edge in &unblocked {
                if let Some(indexed) = self.indexed(edge) {
                    graph.add_edge(indexed.from, indexed.to, indexed.weight);
                }
            }
        }
        tracing::debug!(obstacle = %id, unblocked = unblocked.len(), "obstacle removed");
        self.events.emit(NavEvent::ObstacleRemoved {
            id,
            unblocked_edges: unblocked.clone(),
        });
        Some(unblocked)
    }

    /// Replaces an obstacle's shape: removal followed by insertion under a fresh id.
    pub fn update_obstacle(
        &mut self,
        graph: &mut Graph,
        id: ObstacleId,
        obstacle: Polygon,
    ) -> ObstacleId {
        self.remove_obstacle(graph, id);
        self.add_obstacle(graph, obstacle)
    }

    /// Makes `graph` agree with the blocked set: blocked edges removed, the rest present.
    ///
    /// Needed after changes made with `auto_update` off.
    pub fn apply_blocked_edges(&self, graph: &mut Graph) {
        for edge in self.grid.iter() {
            if self.coverage.contains_key(&edge.id) {
                graph.remove_edge(edge.from, edge.to);
            } else if !graph.has_edge(edge.from, edge.to) {
                graph.add_edge(edge.from, edge.to, edge.weight);
            }
        }
    }

    fn indexed(&self, id: &EdgeId) -> Option<&IndexedEdge> {
        self.by_id.get(id).and_then(|i| self.grid.get(*i))
    }

    pub fn indexed_edge(&self, id: &EdgeId) -> Option<&IndexedEdge> {
        self.indexed(id)
    }

    pub fn indexed_edge_count(&self) -> usize {
        self.grid.len()
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Polygon> {
        self.obstacles.get(&id)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = (ObstacleId, &Polygon)> {
        self.obstacles.iter().map(|(id, p)| (*id, p))
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_edge_blocked(&self, id: &EdgeId) -> bool {
        self.coverage.contains_key(id)
    }

    /// Whether the undirected edge `a <-> b` is currently blocked.
    pub fn is_blocked_between(&self, a: NodeId, b: NodeId) -> bool {
        self.by_pair
            .get(&(a.min(b), a.max(b)))
            .is_some_and(|id| self.coverage.contains_key(id))
    }

    pub fn blocked_edges(&self) -> impl Iterator<Item = &EdgeId> {
        self.coverage.keys()
    }

    pub fn blocked_edge_count(&self) -> usize {
        self.coverage.len()
    }

    pub fn blocking_obstacles(&self, id: &EdgeId) -> Option<&BTreeSet<ObstacleId>> {
        self.coverage.get(id)
    }

    /// Edges `id` is blocking, whether or not other obstacles also cover them.
    pub fn edges_blocked_by(&self, id: ObstacleId) -> Option<&BTreeSet<EdgeId>> {
        self.blocks.get(&id)
    }
}
