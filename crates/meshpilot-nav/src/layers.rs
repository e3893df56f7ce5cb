use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use meshpilot_geom::DEFAULT_LAYER;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::graph::{Graph, GraphEdge, GraphNode};

/// Display and cost metadata for a named layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LayerConfig {
    pub color: String,
    pub traversal_cost: f64,
    pub image_id: Option<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
            traversal_cost: 1.0,
            image_id: None,
        }
    }
}

/// Caller-supplied state handed to every filter predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalContext {
    pub allowed_layers: BTreeSet<String>,
    pub attributes: BTreeMap<String, f64>,
}

impl TraversalContext {
    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }
}

pub type NodePredicate = Arc<dyn Fn(&GraphNode, &TraversalContext) -> bool + Send + Sync>;
pub type NodeCostFn = Arc<dyn Fn(&GraphNode, &TraversalContext) -> f64 + Send + Sync>;

#[derive(Clone)]
pub enum CostModifier {
    Constant(f64),
    Dynamic(NodeCostFn),
}

impl CostModifier {
    fn factor(&self, node: &GraphNode, ctx: &TraversalContext) -> f64 {
        match self {
            CostModifier::Constant(v) => *v,
            CostModifier::Dynamic(f) => f(node, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterKind {
    Inclusion,
    Exclusion,
    CostModifier,
}

/// A per-layer rule evaluated against candidate nodes.
#[derive(Clone)]
pub enum LayerFilter {
    /// Keeps the node only if the predicate holds.
    Inclusion(NodePredicate),
    /// Drops the node if the predicate holds.
    Exclusion(NodePredicate),
    /// Multiplies the node's traversal cost.
    CostModifier(CostModifier),
}

impl LayerFilter {
    pub fn include<F>(predicate: F) -> Self
    where
        F: Fn(&GraphNode, &TraversalContext) -> bool + Send + Sync + 'static,
    {
        LayerFilter::Inclusion(Arc::new(predicate))
    }

    pub fn exclude<F>(predicate: F) -> Self
    where
        F: Fn(&GraphNode, &TraversalContext) -> bool + Send + Sync + 'static,
    {
        LayerFilter::Exclusion(Arc::new(predicate))
    }

    pub fn cost(factor: f64) -> Self {
        LayerFilter::CostModifier(CostModifier::Constant(factor))
    }

    pub fn cost_with<F>(factor: F) -> Self
    where
        F: Fn(&GraphNode, &TraversalContext) -> f64 + Send + Sync + 'static,
    {
        LayerFilter::CostModifier(CostModifier::Dynamic(Arc::new(factor)))
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            LayerFilter::Inclusion(_) => FilterKind::Inclusion,
            LayerFilter::Exclusion(_) => FilterKind::Exclusion,
            LayerFilter::CostModifier(_) => FilterKind::CostModifier,
        }
    }
}

impl fmt::Debug for LayerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerFilter::CostModifier(CostModifier::Constant(v)) => {
                f.debug_tuple("CostModifier").field(v).finish()
            }
            other => write!(f, "{:?}(..)", other.kind()),
        }
    }
}

#[derive(Debug, Clone)]
struct LayerEntry {
    config: LayerConfig,
    filters: Vec<LayerFilter>,
}

/// Registry of named layers and the filters attached to them.
///
/// The `"default"` layer always exists.
#[derive(Debug, Clone)]
pub struct LayerSystem {
    layers: BTreeMap<String, LayerEntry>,
}

impl Default for LayerSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerSystem {
    pub fn new() -> Self {
        let mut layers = BTreeMap::new();
        layers.insert(
            DEFAULT_LAYER.to_string(),
            LayerEntry {
                config: LayerConfig {
                    color: "#4a4a4a".to_string(),
                    traversal_cost: 1.0,
                    image_id: None,
                },
                filters: Vec::new(),
            },
        );
        Self { layers }
    }

    pub fn register_layer(&mut self, name: impl Into<String>, config: LayerConfig) -> Result<()> {
        let name = name.into();
        if self.layers.contains_key(&name) {
            return Err(NavError::DuplicateLayer { layer: name });
        }
        tracing::debug!(layer = %name, cost = config.traversal_cost, "layer registered");
        self.layers.insert(
            name,
            LayerEntry {
                config,
                filters: Vec::new(),
            },
        );
        Ok(())
    }

    /// Appends `filter` to the layer's filter list; filters run in insertion order.
    pub fn add_filter(&mut self, layer: &str, filter: LayerFilter) -> Result<()> {
        let entry = self
            .layers
            .get_mut(layer)
            .ok_or_else(|| NavError::UnknownLayer {
                layer: layer.to_string(),
            })?;
        entry.filters.push(filter);
        Ok(())
    }

    pub fn contains(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    pub fn layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers.get(name).map(|e| &e.config)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn filter_count(&self, layer: &str) -> usize {
        self.layers.get(layer).map_or(0, |e| e.filters.len())
    }

    /// Runs the filters of the node's layer over `node`, adjusting its traversal cost in
    /// place. Returns whether the node survives. Every filter runs even after one rejects.
    pub fn evaluate(&self, node: &mut GraphNode, ctx: &TraversalContext) -> bool {
        let Some(entry) = self.layers.get(node.layer()) else {
            return true;
        };
        let mut keep = true;
        for filter in &entry.filters {
            match filter {
                LayerFilter::Inclusion(pred) => keep &= pred(node, ctx),
                LayerFilter::Exclusion(pred) => keep &= !pred(node, ctx),
                LayerFilter::CostModifier(modifier) => {
                    node.traversal_cost *= modifier.factor(node, ctx);
                }
            }
        }
        keep
    }

    /// Filtered copies of `nodes`; the inputs are never mutated.
    pub fn apply_filters<'n, I>(&self, nodes: I, ctx: &TraversalContext) -> Vec<GraphNode>
    where
        I: IntoIterator<Item = &'n GraphNode>,
    {
        nodes
            .into_iter()
            .filter_map(|node| {
                let mut scratch = node.clone();
                self.evaluate(&mut scratch, ctx).then_some(scratch)
            })
            .collect()
    }

    /// `edge.weight` scaled by the mean traversal cost of the endpoint layers.
    pub fn calculate_edge_cost(&self, graph: &Graph, edge: &GraphEdge) -> Result<f64> {
        let layer_cost = |id| -> Result<f64> {
            let node = graph.node(id).ok_or_else(|| NavError::Operation {
                operation: "calculate_edge_cost",
                message: format!("node {id} is not in the graph"),
            })?;
            self.layer(node.layer())
                .map(|c| c.traversal_cost)
                .ok_or_else(|| NavError::UnknownLayer {
                    layer: node.layer().to_string(),
                })
        };
        let avg = (layer_cost(edge.from)? + layer_cost(edge.to)?) / 2.0;
        Ok(edge.weight * avg)
    }

    /// Subgraph of `graph` induced by the nodes that survive filtering.
    pub fn filter_graph(&self, graph: &Graph, ctx: &TraversalContext) -> Graph {
        let mut filtered = Graph::new();
        for node in self.apply_filters(graph.nodes(), ctx) {
            filtered.add_node(node);
        }
        for edge in graph.edges() {
            filtered.add_edge(edge.from, edge.to, edge.weight);
        }
        filtered
    }
}
