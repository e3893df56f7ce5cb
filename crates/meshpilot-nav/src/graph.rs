use std::collections::BTreeMap;
use std::sync::Arc;

use meshpilot_geom::{Polygon, Vec2};

/// Index of a polygon in the owning mesh's polygon list.
pub type NodeId = usize;

/// A graph vertex: one walkable polygon plus its (possibly filter-adjusted) traversal cost.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub polygon: Arc<Polygon>,
    pub traversal_cost: f64,
}

impl GraphNode {
    pub fn new(id: NodeId, polygon: Arc<Polygon>) -> Self {
        let traversal_cost = polygon.traversal_cost();
        Self {
            id,
            polygon,
            traversal_cost,
        }
    }

    pub fn centroid(&self) -> Vec2 {
        self.polygon.centroid()
    }

    pub fn layer(&self) -> &str {
        self.polygon.layer()
    }
}

/// One direction of an undirected adjacency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

/// Undirected weighted graph over polygon nodes.
///
/// Every edge is stored in both endpoint adjacency lists, and each list stays sorted by
/// neighbour id so that removing and re-adding an edge reproduces the same structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, GraphNode>,
    adjacency: BTreeMap<NodeId, Vec<GraphEdge>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.adjacency.entry(node.id).or_default();
        self.nodes.insert(node.id, node);
    }

    /// Inserts (or re-weights) the undirected edge `a <-> b`.
    ///
    /// Returns `false` when either endpoint is missing or `a == b`.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> bool {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return false;
        }
        self.insert_directed(a, b, weight);
        self.insert_directed(b, a, weight);
        true
    }

    fn insert_directed(&mut self, from: NodeId, to: NodeId, weight: f64) {
        let list = self.adjacency.entry(from).or_default();
        match list.binary_search_by_key(&to, |e| e.to) {
            Ok(i) => list[i].weight = weight,
            Err(i) => list.insert(i, GraphEdge { from, to, weight }),
        }
    }

    /// Removes `a <-> b`, returning the weight it carried.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<f64> {
        let weight = self.remove_directed(a, b);
        self.remove_directed(b, a);
        weight
    }

    fn remove_directed(&mut self, from: NodeId, to: NodeId) -> Option<f64> {
        let list = self.adjacency.get_mut(&from)?;
        let i = list.binary_search_by_key(&to, |e| e.to).ok()?;
        Some(list.remove(i).weight)
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some()
    }

    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&GraphEdge> {
        let list = self.adjacency.get(&a)?;
        list.binary_search_by_key(&b, |e| e.to)
            .ok()
            .map(|i| &list[i])
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Outgoing edges of `id`, sorted by neighbour id. Empty for unknown nodes.
    pub fn neighbors(&self, id: NodeId) -> &[GraphEdge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Each undirected edge once, oriented from the lower node id.
    pub fn edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.adjacency
            .values()
            .flatten()
            .filter(|e| e.from < e.to)
            .copied()
    }

    /// `(neighbour, weight)` lists per node, for structural comparisons.
    pub fn adjacency_snapshot(&self) -> BTreeMap<NodeId, Vec<(NodeId, f64)>> {
        self.adjacency
            .iter()
            .map(|(id, list)| (*id, list.iter().map(|e| (e.to, e.weight)).collect()))
            .collect()
    }
}
