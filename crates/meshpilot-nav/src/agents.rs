//! Agent profiles, per-profile derived graphs, and agent movement along planned paths.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use meshpilot_geom::{Vec2, DEFAULT_LAYER};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{NavError, Result};
use crate::graph::{Graph, GraphEdge, GraphNode};
use crate::layers::{LayerSystem, TraversalContext};
use crate::pathfinder::{PathQuery, PathResult};

/// Terrain multiplier for layers a profile does not list.
pub const DEFAULT_UNLISTED_TERRAIN_COST: f64 = 1000.0;

/// Movement capabilities shared by a class of agents.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AgentProfile {
    pub radius: f64,
    /// Narrowest polygon (by bounding-box extent) the agent fits through
    pub min_path_width: f64,
    /// Steepest walkable slope, in degrees
    pub max_slope: f64,
    pub allowed_layers: BTreeSet<String>,
    /// Per-layer multipliers applied to edge weights
    pub terrain_costs: BTreeMap<String, f64>,
    pub unlisted_terrain_cost: f64,
    pub step_height: f64,
    pub jump_height: f64,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            radius: 1.0,
            min_path_width: 2.0,
            max_slope: 45.0,
            allowed_layers: BTreeSet::from([DEFAULT_LAYER.to_string()]),
            terrain_costs: BTreeMap::new(),
            unlisted_terrain_cost: DEFAULT_UNLISTED_TERRAIN_COST,
            step_height: 0.5,
            jump_height: 0.0,
        }
    }
}

impl AgentProfile {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(NavError::InvalidProfile { reason });
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return invalid(format!("radius must be positive, got {}", self.radius));
        }
        if !(self.min_path_width >= self.radius * 2.0) {
            return invalid(format!(
                "min_path_width {} is narrower than the agent diameter {}",
                self.min_path_width,
                self.radius * 2.0
            ));
        }
        if !(0.0..=90.0).contains(&self.max_slope) {
            return invalid(format!("max_slope {} is outside 0..=90", self.max_slope));
        }
        if let Some((layer, cost)) = self
            .terrain_costs
            .iter()
            .find(|(_, c)| !(c.is_finite() && **c >= 0.0))
        {
            return invalid(format!("terrain cost {cost} for layer `{layer}` is invalid"));
        }
        if self.step_height < 0.0 || self.jump_height < 0.0 {
            return invalid("step and jump heights must be non-negative".to_string());
        }
        Ok(())
    }

    pub fn terrain_cost(&self, layer: &str) -> f64 {
        self.terrain_costs
            .get(layer)
            .copied()
            .unwrap_or(self.unlisted_terrain_cost)
    }

    /// Whether an agent standing on `from` may take `edge`.
    pub fn accepts(&self, graph: &Graph, edge: &GraphEdge, from: &GraphNode) -> bool {
        let Some(to) = graph.node(edge.to) else {
            return false;
        };
        from.polygon.width().min(to.polygon.width()) >= self.min_path_width
            && to.polygon.slope_degrees() <= self.max_slope
            && self.allowed_layers.contains(to.layer())
    }

    fn context(&self) -> TraversalContext {
        TraversalContext {
            allowed_layers: self.allowed_layers.clone(),
            attributes: BTreeMap::from([
                ("radius".to_string(), self.radius),
                ("min_path_width".to_string(), self.min_path_width),
                ("max_slope".to_string(), self.max_slope),
                ("step_height".to_string(), self.step_height),
                ("jump_height".to_string(), self.jump_height),
            ]),
        }
    }
}

/// Cache key for derived graphs: profiles with equal keys share one graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileKey {
    min_path_width: u64,
    allowed_layers: Vec<String>,
    terrain_costs: Vec<(String, u64)>,
    unlisted_terrain_cost: u64,
    context: Vec<u64>,
}

/// Signature of everything that influences the graph derived for `profile`.
pub fn profile_signature(profile: &AgentProfile) -> ProfileKey {
    ProfileKey {
        min_path_width: profile.min_path_width.to_bits(),
        allowed_layers: profile.allowed_layers.iter().cloned().collect(),
        terrain_costs: profile
            .terrain_costs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_bits()))
            .collect(),
        unlisted_terrain_cost: profile.unlisted_terrain_cost.to_bits(),
        // Filter predicates see these through the traversal context.
        context: [
            profile.radius,
            profile.max_slope,
            profile.step_height,
            profile.jump_height,
        ]
        .iter()
        .map(|v| v.to_bits())
        .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    profile_name: String,
    profile: Arc<AgentProfile>,
    position: Vec2,
    target: Option<Vec2>,
    path: VecDeque<Vec2>,
    graph: Option<Arc<Graph>>,
}

impl Agent {
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Remaining waypoints, nearest first.
    pub fn path(&self) -> impl ExactSizeIterator<Item = &Vec2> {
        self.path.iter()
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// The derived graph the agent last planned on, if still valid.
    pub fn graph(&self) -> Option<&Arc<Graph>> {
        self.graph.as_ref()
    }
}

/// Owns profiles and agents, and caches one derived graph per distinct profile signature.
#[derive(Debug, Default)]
pub struct AgentManager {
    search: SearchConfig,
    profiles: BTreeMap<String, Arc<AgentProfile>>,
    agents: BTreeMap<AgentId, Agent>,
    cache: BTreeMap<ProfileKey, Arc<Graph>>,
}

impl AgentManager {
    pub fn new(search: SearchConfig) -> Self {
        Self {
            search,
            ..Self::default()
        }
    }

    /// Validates and stores `profile`, replacing any profile with the same name.
    pub fn register_profile(&mut self, name: impl Into<String>, profile: AgentProfile) -> Result<()> {
        profile.validate()?;
        let name = name.into();
        tracing::debug!(profile = %name, "profile registered");
        self.profiles.insert(name, Arc::new(profile));
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&AgentProfile> {
        self.profiles.get(name).map(Arc::as_ref)
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Drops every cached derived graph. Agents re-derive on their next plan.
    pub fn invalidate_cache(&mut self) {
        if !self.cache.is_empty() {
            tracing::debug!(graphs = self.cache.len(), "agent graph cache invalidated");
        }
        self.cache.clear();
        for agent in self.agents.values_mut() {
            agent.graph = None;
        }
    }

    pub fn cached_graph_count(&self) -> usize {
        self.cache.len()
    }

    /// Derived graph for `profile`, built on first use and shared afterwards.
    pub fn graph_for(
        &mut self,
        profile: &AgentProfile,
        base: &Graph,
        layers: &LayerSystem,
    ) -> Arc<Graph> {
        let key = profile_signature(profile);
        Arc::clone(
            self.cache
                .entry(key)
                .or_insert_with(|| Arc::new(derive_graph(profile, base, layers))),
        )
    }

    /// Creates (or replaces) an agent at `position` using a registered profile.
    pub fn create_agent(
        &mut self,
        id: impl Into<AgentId>,
        profile_name: &str,
        position: Vec2,
        base: &Graph,
        layers: &LayerSystem,
    ) -> Result<&Agent> {
        let profile = self
            .profiles
            .get(profile_name)
            .cloned()
            .ok_or_else(|| NavError::UnknownProfile {
                name: profile_name.to_string(),
            })?;
        let graph = self.graph_for(&profile, base, layers);
        let id = id.into();
        tracing::debug!(agent = %id, profile = profile_name, "agent created");
        let agent = Agent {
            id: id.clone(),
            profile_name: profile_name.to_string(),
            profile,
            position,
            target: None,
            path: VecDeque::new(),
            graph: Some(graph),
        };
        self.agents.insert(id.clone(), agent);
        Ok(&self.agents[&id])
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    /// Plans a path to `target` and, if planning succeeds, makes it the agent's target.
    ///
    /// On error the agent keeps its previous target and path.
    pub fn set_agent_target(
        &mut self,
        id: &AgentId,
        target: Vec2,
        partial: bool,
        base: &Graph,
        layers: &LayerSystem,
    ) -> Result<PathResult> {
        self.plan(id, target, partial, base, layers)
    }

    /// Re-plans towards the current target; `None` if the agent has no target.
    pub fn recalculate_path(
        &mut self,
        id: &AgentId,
        partial: bool,
        base: &Graph,
        layers: &LayerSystem,
    ) -> Result<Option<PathResult>> {
        let Some(target) = self.agent_mut(id)?.target else {
            return Ok(None);
        };
        self.plan(id, target, partial, base, layers).map(Some)
    }

    fn agent_mut(&mut self, id: &AgentId) -> Result<&mut Agent> {
        self.agents.get_mut(id).ok_or_else(|| NavError::UnknownAgent {
            id: id.to_string(),
        })
    }

    /// Searches from the agent's position to `target`. Target, path and graph are only
    /// written once the search has succeeded.
    fn plan(
        &mut self,
        id: &AgentId,
        target: Vec2,
        partial: bool,
        base: &Graph,
        layers: &LayerSystem,
    ) -> Result<PathResult> {
        let (profile, position) = {
            let agent = self.agent_mut(id)?;
            (Arc::clone(&agent.profile), agent.position)
        };
        let graph = self.graph_for(&profile, base, layers);

        let result = PathQuery::new(&graph, position, target)
            .with_config(&self.search)
            .partial_path(partial)
            .validator(|edge, from| profile.accepts(&graph, edge, from))
            .cost_fn(|edge| {
                let factor = graph.node(edge.to).map_or(1.0, |n| n.traversal_cost);
                edge.weight * factor
            })
            .run()?;

        let agent = self.agent_mut(id)?;
        agent.target = Some(target);
        agent.path = result.points.iter().copied().collect();
        agent.graph = Some(graph);
        tracing::debug!(
            agent = %id,
            waypoints = agent.path.len(),
            complete = result.complete,
            "agent path planned"
        );
        Ok(result)
    }

    /// Advances the agent by `step` world units along its path, possibly passing several
    /// waypoints. Reaching the final waypoint clears the target. Returns the new position.
    pub fn update_agent(&mut self, id: &AgentId, step: f64) -> Result<Vec2> {
        let agent = self.agent_mut(id)?;
        let mut remaining = step.max(0.0);
        let mut arrived = false;

        while let Some(&waypoint) = agent.path.front() {
            let d = agent.position.distance(waypoint);
            if d <= remaining {
                agent.position = waypoint;
                remaining -= d;
                agent.path.pop_front();
                arrived = agent.path.is_empty();
                continue;
            }
            if remaining > 0.0 {
                agent.position = agent.position + (waypoint - agent.position) * (remaining / d);
            }
            break;
        }
        if arrived {
            agent.target = None;
        }
        Ok(agent.position)
    }
}

/// Builds the graph an agent with `profile` plans on.
///
/// Keeps nodes on allowed layers that survive the layer filters, and the base edges between
/// them re-weighted by the mean terrain multiplier of their endpoints.
pub fn derive_graph(profile: &AgentProfile, base: &Graph, layers: &LayerSystem) -> Graph {
    let ctx = profile.context();
    let allowed = base
        .nodes()
        .filter(|n| profile.allowed_layers.contains(n.layer()));

    let mut graph = Graph::new();
    for node in layers.apply_filters(allowed, &ctx) {
        graph.add_node(node);
    }
    for edge in base.edges() {
        let (Some(a), Some(b)) = (graph.node(edge.from), graph.node(edge.to)) else {
            continue;
        };
        let factor = (profile.terrain_cost(a.layer()) + profile.terrain_cost(b.layer())) / 2.0;
        graph.add_edge(edge.from, edge.to, edge.weight * factor);
    }
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "derived agent graph"
    );
    graph
}
