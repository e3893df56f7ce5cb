//! Graph search over a navigation [`Graph`]: A*, Dijkstra, BFS and DFS behind one query type.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use std::fmt;
use std::str::FromStr;

use meshpilot_geom::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{NavError, Result};
use crate::events::{EventBus, NavEvent};
use crate::graph::{Graph, GraphEdge, GraphNode, NodeId};

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Algorithm {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "astar", alias = "A*", alias = "a_star"))]
    AStar,
    #[cfg_attr(feature = "serde", serde(rename = "dijkstra"))]
    Dijkstra,
    #[cfg_attr(feature = "serde", serde(rename = "bfs"))]
    Bfs,
    #[cfg_attr(feature = "serde", serde(rename = "dfs"))]
    Dfs,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::AStar => "A*",
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a*" | "astar" | "a_star" | "a-star" => Ok(Algorithm::AStar),
            "dijkstra" => Ok(Algorithm::Dijkstra),
            "bfs" => Ok(Algorithm::Bfs),
            "dfs" => Ok(Algorithm::Dfs),
            _ => Err(NavError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// Start or goal of a query: an explicit node, or a point resolved to the node whose
/// centroid is nearest.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathEndpoint {
    Node(NodeId),
    Point(Vec2),
}

impl From<NodeId> for PathEndpoint {
    fn from(id: NodeId) -> Self {
        PathEndpoint::Node(id)
    }
}

impl From<Vec2> for PathEndpoint {
    fn from(p: Vec2) -> Self {
        PathEndpoint::Point(p)
    }
}

impl fmt::Display for PathEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathEndpoint::Node(id) => write!(f, "node {id}"),
            PathEndpoint::Point(p) => write!(f, "({}, {})", p.x, p.y),
        }
    }
}

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    GoalReached,
    FrontierExhausted,
    IterationLimit,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathResult {
    pub start: NodeId,
    pub goal: NodeId,
    /// Node sequence beginning at `start`; empty when nothing usable was found.
    pub nodes: Vec<NodeId>,
    /// Centroids of `nodes`.
    pub points: Vec<Vec2>,
    /// Sum of straight-line distances between consecutive `points`.
    pub distance: f64,
    /// The last node is the goal.
    pub complete: bool,
    /// Nodes expanded by the search.
    pub iterations: usize,
    pub termination: Termination,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub type Heuristic<'a> = Box<dyn Fn(Vec2, Vec2) -> f64 + 'a>;
pub type EdgeCost<'a> = Box<dyn Fn(&GraphEdge) -> f64 + 'a>;
pub type EdgeValidator<'a> = Box<dyn Fn(&GraphEdge, &GraphNode) -> bool + 'a>;

/// A configured search over a borrowed graph.
///
/// Defaults: A*, Euclidean heuristic between centroids, edge weight as cost, every edge
/// valid, 10 000 iterations, partial paths on, no smoothing.
pub struct PathQuery<'a> {
    graph: &'a Graph,
    start: PathEndpoint,
    end: PathEndpoint,
    algorithm: Algorithm,
    heuristic: Option<Heuristic<'a>>,
    cost: Option<EdgeCost<'a>>,
    validator: Option<EdgeValidator<'a>>,
    max_iterations: usize,
    partial_path: bool,
    smooth_path: bool,
}

impl fmt::Debug for PathQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathQuery")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("algorithm", &self.algorithm)
            .field("custom_heuristic", &self.heuristic.is_some())
            .field("custom_cost", &self.cost.is_some())
            .field("validator", &self.validator.is_some())
            .field("max_iterations", &self.max_iterations)
            .field("partial_path", &self.partial_path)
            .field("smooth_path", &self.smooth_path)
            .finish()
    }
}

impl<'a> PathQuery<'a> {
    pub fn new(
        graph: &'a Graph,
        start: impl Into<PathEndpoint>,
        end: impl Into<PathEndpoint>,
    ) -> Self {
        Self {
            graph,
            start: start.into(),
            end: end.into(),
            algorithm: Algorithm::AStar,
            heuristic: None,
            cost: None,
            validator: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            partial_path: true,
            smooth_path: false,
        }
    }

    pub fn with_config(mut self, config: &SearchConfig) -> Self {
        self.algorithm = config.algorithm;
        self.max_iterations = config.max_iterations;
        self.partial_path = config.partial_path;
        self.smooth_path = config.smooth_path;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Estimate between a node centroid and the goal centroid (A* only).
    pub fn heuristic(mut self, h: impl Fn(Vec2, Vec2) -> f64 + 'a) -> Self {
        self.heuristic = Some(Box::new(h));
        self
    }

    pub fn cost_fn(mut self, cost: impl Fn(&GraphEdge) -> f64 + 'a) -> Self {
        self.cost = Some(Box::new(cost));
        self
    }

    /// Predicate over `(edge, node being expanded)`; rejected edges are never traversed.
    pub fn validator(mut self, valid: impl Fn(&GraphEdge, &GraphNode) -> bool + 'a) -> Self {
        self.validator = Some(Box::new(valid));
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn partial_path(mut self, enabled: bool) -> Self {
        self.partial_path = enabled;
        self
    }

    pub fn smooth_path(mut self, enabled: bool) -> Self {
        self.smooth_path = enabled;
        self
    }

    pub fn start(&self) -> PathEndpoint {
        self.start
    }

    pub fn end(&self) -> PathEndpoint {
        self.end
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub fn run(&self) -> Result<PathResult> {
        find_path(self)
    }

    fn estimate(&self, from: Vec2, to: Vec2) -> f64 {
        match &self.heuristic {
            Some(h) => h(from, to),
            None => from.distance(to),
        }
    }

    fn edge_cost(&self, edge: &GraphEdge) -> f64 {
        match &self.cost {
            Some(c) => c(edge),
            None => edge.weight,
        }
    }

    fn accepts(&self, edge: &GraphEdge, node: &GraphNode) -> bool {
        self.validator.as_ref().map_or(true, |v| v(edge, node))
    }
}

/// Runs `query` and reports it on `events`: path-requested first, then path-found or
/// path-blocked (empty result) or error.
pub fn find_path_observed(query: &PathQuery<'_>, events: &mut EventBus) -> Result<PathResult> {
    events.emit(NavEvent::PathRequested {
        start: query.start,
        end: query.end,
    });
    match find_path(query) {
        Ok(result) => {
            if result.is_empty() {
                events.emit(NavEvent::PathBlocked {
                    start: query.start,
                    end: query.end,
                });
            } else {
                events.emit(NavEvent::PathFound {
                    nodes: result.nodes.clone(),
                    complete: result.complete,
                });
            }
            Ok(result)
        }
        Err(err) => {
            events.emit(NavEvent::Error {
                operation: "find_path",
                message: err.to_string(),
            });
            Err(err)
        }
    }
}

pub fn find_path(query: &PathQuery<'_>) -> Result<PathResult> {
    let graph = query.graph;
    let start = resolve(graph, query.start, "start")?;
    let goal = resolve(graph, query.end, "end")?;

    let outcome = match query.algorithm {
        Algorithm::AStar => best_first(query, start, goal, true),
        Algorithm::Dijkstra => best_first(query, start, goal, false),
        Algorithm::Bfs => uninformed(query, start, goal, Frontier::Queue),
        Algorithm::Dfs => uninformed(query, start, goal, Frontier::Stack),
    };

    let mut nodes = match outcome.termination {
        Termination::GoalReached => reconstruct(&outcome.came_from, goal),
        _ if query.partial_path => reconstruct(&outcome.came_from, outcome.last),
        _ => Vec::new(),
    };
    if query.smooth_path {
        nodes = smooth(query, &nodes);
    }

    let points: Vec<Vec2> = nodes
        .iter()
        .filter_map(|id| graph.node(*id))
        .map(GraphNode::centroid)
        .collect();
    let distance = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let complete = nodes.last() == Some(&goal);

    tracing::debug!(
        algorithm = %query.algorithm,
        start,
        goal,
        len = nodes.len(),
        complete,
        iterations = outcome.iterations,
        termination = ?outcome.termination,
        "path search finished"
    );

    Ok(PathResult {
        start,
        goal,
        nodes,
        points,
        distance,
        complete,
        iterations: outcome.iterations,
        termination: outcome.termination,
    })
}

fn resolve(graph: &Graph, endpoint: PathEndpoint, which: &'static str) -> Result<NodeId> {
    match endpoint {
        PathEndpoint::Node(id) if graph.contains_node(id) => Ok(id),
        PathEndpoint::Node(id) => Err(NavError::NodeResolution {
            which,
            reason: format!("node {id} is not in the graph"),
        }),
        PathEndpoint::Point(p) if !p.is_finite() => Err(NavError::NodeResolution {
            which,
            reason: format!("point ({}, {}) is not finite", p.x, p.y),
        }),
        PathEndpoint::Point(p) => {
            let mut best: Option<(NodeId, f64)> = None;
            for node in graph.nodes() {
                let d = node.centroid().distance(p);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((node.id, d));
                }
            }
            best.map(|(id, _)| id).ok_or(NavError::NodeResolution {
                which,
                reason: "graph has no nodes".to_string(),
            })
        }
    }
}

struct SearchOutcome {
    came_from: BTreeMap<NodeId, NodeId>,
    last: NodeId,
    iterations: usize,
    termination: Termination,
}

struct OpenNode {
    f: f64,
    g: f64,
    node: NodeId,
    tie: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap; earlier pushes win ties.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* when `informed`, Dijkstra otherwise. Improved entries are pushed again and stale
/// heap entries are skipped on pop.
fn best_first(query: &PathQuery<'_>, start: NodeId, goal: NodeId, informed: bool) -> SearchOutcome {
    let graph = query.graph;
    let goal_center = graph.node(goal).map(GraphNode::centroid).unwrap_or_default();
    let h = |id: NodeId| -> f64 {
        if !informed {
            return 0.0;
        }
        graph
            .node(id)
            .map_or(0.0, |n| query.estimate(n.centroid(), goal_center))
    };

    let mut open = BinaryHeap::new();
    let mut g_score: BTreeMap<NodeId, f64> = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let mut tie = 0u64;

    g_score.insert(start, 0.0);
    open.push(OpenNode {
        f: h(start),
        g: 0.0,
        node: start,
        tie,
    });

    let mut iterations = 0;
    let mut last = start;
    let termination = loop {
        if iterations >= query.max_iterations {
            break Termination::IterationLimit;
        }
        let Some(current) = open.pop() else {
            break Termination::FrontierExhausted;
        };
        if g_score.get(&current.node).is_some_and(|best| current.g > *best) {
            continue;
        }
        iterations += 1;
        last = current.node;
        if current.node == goal {
            break Termination::GoalReached;
        }
        let Some(node) = graph.node(current.node) else {
            continue;
        };

        for edge in graph.neighbors(current.node) {
            if !graph.contains_node(edge.to) || !query.accepts(edge, node) {
                continue;
            }
            let tentative = current.g + query.edge_cost(edge);
            if tentative < g_score.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                g_score.insert(edge.to, tentative);
                came_from.insert(edge.to, current.node);
                tie += 1;
                open.push(OpenNode {
                    f: tentative + h(edge.to),
                    g: tentative,
                    node: edge.to,
                    tie,
                });
            }
        }
    };

    SearchOutcome {
        came_from,
        last,
        iterations,
        termination,
    }
}

#[derive(Clone, Copy)]
enum Frontier {
    Queue,
    Stack,
}

/// BFS (`Queue`) or DFS (`Stack`); nodes are marked visited when enqueued.
fn uninformed(query: &PathQuery<'_>, start: NodeId, goal: NodeId, order: Frontier) -> SearchOutcome {
    let graph = query.graph;
    let mut frontier = VecDeque::from([start]);
    let mut visited = BTreeSet::from([start]);
    let mut came_from = BTreeMap::new();

    let mut iterations = 0;
    let mut last = start;
    let termination = loop {
        if iterations >= query.max_iterations {
            break Termination::IterationLimit;
        }
        let next = match order {
            Frontier::Queue => frontier.pop_front(),
            Frontier::Stack => frontier.pop_back(),
        };
        let Some(current) = next else {
            break Termination::FrontierExhausted;
        };
        iterations += 1;
        last = current;
        if current == goal {
            break Termination::GoalReached;
        }
        let Some(node) = graph.node(current) else {
            continue;
        };

        for edge in graph.neighbors(current) {
            if visited.contains(&edge.to)
                || !graph.contains_node(edge.to)
                || !query.accepts(edge, node)
            {
                continue;
            }
            visited.insert(edge.to);
            came_from.insert(edge.to, current);
            frontier.push_back(edge.to);
        }
    };

    SearchOutcome {
        came_from,
        last,
        iterations,
        termination,
    }
}

/// Follows predecessor links back from `end`; the chain always terminates at the start.
fn reconstruct(came_from: &BTreeMap<NodeId, NodeId>, end: NodeId) -> Vec<NodeId> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        if path.len() > came_from.len() {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Greedy shortcut pass: from each kept waypoint, jump to the furthest later waypoint that
/// is directly connected by an edge the query accepts.
fn smooth(query: &PathQuery<'_>, nodes: &[NodeId]) -> Vec<NodeId> {
    if nodes.len() <= 2 {
        return nodes.to_vec();
    }
    let graph = query.graph;
    let mut out = vec![nodes[0]];
    let mut anchor = 0;
    while anchor + 1 < nodes.len() {
        let from = nodes[anchor];
        let next = (anchor + 2..nodes.len())
            .rev()
            .find(|&k| {
                let (Some(edge), Some(node)) = (graph.edge(from, nodes[k]), graph.node(from))
                else {
                    return false;
                };
                query.accepts(edge, node)
            })
            .unwrap_or(anchor + 1);
        out.push(nodes[next]);
        anchor = next;
    }
    out
}
