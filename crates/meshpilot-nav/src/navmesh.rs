use std::sync::Arc;

use meshpilot_geom::{GeometryKernel, Polygon, Vec2};

use crate::agents::{Agent, AgentId, AgentManager, AgentProfile};
use crate::config::NavMeshConfig;
use crate::error::{NavError, Result};
use crate::events::{EventBus, GraphChange, NavEvent};
use crate::graph::{Graph, GraphNode, NodeId};
use crate::layers::{LayerConfig, LayerFilter, LayerSystem};
use crate::obstacles::{DynamicObstacleManager, EdgeId, ObstacleId};
use crate::pathfinder::{find_path_observed, PathEndpoint, PathQuery, PathResult};

/// A polygon soup, its adjacency graph, and the subsystems that reshape that graph.
///
/// Node ids are indices into the polygon list. Any change to the graph (rebuild, obstacle
/// added or removed, filter added) invalidates the per-profile agent graphs.
#[derive(Debug)]
pub struct NavMesh {
    config: NavMeshConfig,
    kernel: GeometryKernel,
    polygons: Vec<Arc<Polygon>>,
    graph: Option<Graph>,
    layers: LayerSystem,
    obstacles: DynamicObstacleManager,
    agents: AgentManager,
    events: EventBus,
}

impl Default for NavMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl NavMesh {
    pub fn new() -> Self {
        Self::with_config(NavMeshConfig::default())
    }

    pub fn with_config(config: NavMeshConfig) -> Self {
        Self::with_kernel(config, GeometryKernel::default())
    }

    pub fn with_kernel(config: NavMeshConfig, kernel: GeometryKernel) -> Self {
        Self {
            obstacles: DynamicObstacleManager::new(config.obstacles.clone(), kernel.clone()),
            agents: AgentManager::new(config.search.clone()),
            config,
            kernel,
            polygons: Vec::new(),
            graph: None,
            layers: LayerSystem::new(),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    pub fn kernel(&self) -> &GeometryKernel {
        &self.kernel
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Bus of the obstacle manager (obstacle-added / obstacle-removed).
    pub fn obstacle_events_mut(&mut self) -> &mut EventBus {
        self.obstacles.events_mut()
    }

    fn fail<T>(&mut self, operation: &'static str, err: NavError) -> Result<T> {
        Err(report(&mut self.events, operation, err))
    }

    fn graph_changed(&mut self, change: GraphChange) {
        self.agents.invalidate_cache();
        self.events.emit(NavEvent::GraphUpdated { change });
    }

    // ---------------------------------------------------------------- polygons & graph

    /// Appends a polygon and returns its node id. Its layer must already be registered.
    pub fn add_polygon(&mut self, polygon: Polygon) -> Result<NodeId> {
        if !self.layers.contains(polygon.layer()) {
            let err = NavError::UnregisteredLayer {
                layer: polygon.layer().to_string(),
            };
            return self.fail("add_polygon", err);
        }
        let node = self.polygons.len();
        let layer = polygon.layer().to_string();
        self.polygons.push(Arc::new(polygon));
        self.events.emit(NavEvent::PolygonAdded { node, layer });
        Ok(node)
    }

    pub fn polygons(&self) -> &[Arc<Polygon>] {
        &self.polygons
    }

    pub fn polygon(&self, id: NodeId) -> Option<&Polygon> {
        self.polygons.get(id).map(Arc::as_ref)
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Rebuilds the adjacency graph from every polygon, then re-applies active obstacles.
    pub fn build_graph(&mut self) -> &Graph {
        self.rebuild(&[])
    }

    /// Like [`build_graph`](Self::build_graph), but omits any edge whose centroid segment
    /// crosses one of `obstacles` or starts/ends inside one.
    pub fn build_graph_considering_obstacles(&mut self, obstacles: &[Polygon]) -> &Graph {
        self.rebuild(obstacles)
    }

    fn rebuild(&mut self, obstacles: &[Polygon]) -> &Graph {
        let mut graph = self.construct_graph(obstacles);
        self.obstacles.reindex(&mut graph);
        self.agents.invalidate_cache();

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            static_obstacles = obstacles.len(),
            dynamic_obstacles = self.obstacles.obstacle_count(),
            "graph built"
        );
        self.events.emit(NavEvent::GraphBuilt {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            obstacle_aware: !obstacles.is_empty(),
        });
        self.graph.insert(graph)
    }

    /// Pairwise adjacency over the polygon list; edge weight is centroid distance.
    pub fn construct_graph(&self, obstacles: &[Polygon]) -> Graph {
        let mut graph = Graph::new();
        for (id, polygon) in self.polygons.iter().enumerate() {
            graph.add_node(GraphNode::new(id, Arc::clone(polygon)));
        }

        for (i, a) in self.polygons.iter().enumerate() {
            for (j, b) in self.polygons.iter().enumerate().skip(i + 1) {
                if !self.kernel.polygons_adjacent(a, b) {
                    continue;
                }
                let (ca, cb) = (a.centroid(), b.centroid());
                if obstacles
                    .iter()
                    .any(|o| self.kernel.segment_blocked_by(ca, cb, o))
                {
                    continue;
                }
                graph.add_edge(i, j, ca.distance(cb));
            }
        }
        graph
    }

    // ---------------------------------------------------------------- obstacles

    pub fn obstacles(&self) -> &DynamicObstacleManager {
        &self.obstacles
    }

    /// The active graph and the obstacle manager, or an operation error when no graph has
    /// been built yet.
    fn obstacle_parts(
        &mut self,
        operation: &'static str,
    ) -> Result<(&mut Graph, &mut DynamicObstacleManager)> {
        let Self {
            graph,
            obstacles,
            events,
            ..
        } = self;
        match graph {
            Some(graph) => Ok((graph, obstacles)),
            None => {
                let err = NavError::Operation {
                    operation,
                    message: NavError::GraphNotBuilt.to_string(),
                };
                Err(report(events, operation, err))
            }
        }
    }

    pub fn add_obstacle(&mut self, obstacle: Polygon) -> Result<ObstacleId> {
        let (graph, obstacles) = self.obstacle_parts("add_obstacle")?;
        let id = obstacles.add_obstacle(graph, obstacle);
        self.graph_changed(GraphChange::ObstacleAdded);
        Ok(id)
    }

    /// Returns the edges unblocked by the removal; unknown ids yield an empty list.
    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Result<Vec<EdgeId>> {
        let (graph, obstacles) = self.obstacle_parts("remove_obstacle")?;
        match obstacles.remove_obstacle(graph, id) {
            Some(unblocked) => {
                self.graph_changed(GraphChange::ObstacleRemoved);
                Ok(unblocked)
            }
            None => {
                tracing::debug!(obstacle = %id, "remove of unknown obstacle ignored");
                Ok(Vec::new())
            }
        }
    }

    /// Replaces an obstacle's shape; the obstacle gets a new id.
    pub fn update_obstacle(&mut self, id: ObstacleId, obstacle: Polygon) -> Result<ObstacleId> {
        let (graph, obstacles) = self.obstacle_parts("update_obstacle")?;
        let new_id = obstacles.update_obstacle(graph, id, obstacle);
        self.graph_changed(GraphChange::ObstacleUpdated);
        Ok(new_id)
    }

    /// Syncs the graph with the blocked set when automatic updates are off.
    pub fn apply_blocked_edges(&mut self) -> Result<()> {
        let (graph, obstacles) = self.obstacle_parts("apply_blocked_edges")?;
        obstacles.apply_blocked_edges(graph);
        self.graph_changed(GraphChange::BlockedEdgesApplied);
        Ok(())
    }

    // ---------------------------------------------------------------- layers

    pub fn layers(&self) -> &LayerSystem {
        &self.layers
    }

    pub fn register_layer(&mut self, name: impl Into<String>, config: LayerConfig) -> Result<()> {
        let name = name.into();
        match self.layers.register_layer(name.clone(), config) {
            Ok(()) => {
                self.events.emit(NavEvent::LayerRegistered { name });
                Ok(())
            }
            Err(err) => self.fail("register_layer", err),
        }
    }

    pub fn add_filter(&mut self, layer: &str, filter: LayerFilter) -> Result<()> {
        let kind = filter.kind();
        if let Err(err) = self.layers.add_filter(layer, filter) {
            return self.fail("add_filter", err);
        }
        self.events.emit(NavEvent::FilterAdded {
            layer: layer.to_string(),
            kind,
        });
        self.graph_changed(GraphChange::FilterAdded);
        Ok(())
    }

    // ---------------------------------------------------------------- search

    /// A query over the current graph with the configured search defaults applied.
    pub fn path_query(
        &self,
        start: impl Into<PathEndpoint>,
        end: impl Into<PathEndpoint>,
    ) -> Result<PathQuery<'_>> {
        let graph = self.graph.as_ref().ok_or(NavError::GraphNotBuilt)?;
        Ok(PathQuery::new(graph, start, end).with_config(&self.config.search))
    }

    pub fn find_path(
        &mut self,
        start: impl Into<PathEndpoint>,
        end: impl Into<PathEndpoint>,
    ) -> Result<PathResult> {
        self.find_path_with(start, end, |query| query)
    }

    /// Runs a configured query and reports it on the mesh's event bus.
    ///
    /// `configure` receives a query preloaded with the search defaults.
    pub fn find_path_with<F>(
        &mut self,
        start: impl Into<PathEndpoint>,
        end: impl Into<PathEndpoint>,
        configure: F,
    ) -> Result<PathResult>
    where
        F: for<'g> FnOnce(PathQuery<'g>) -> PathQuery<'g>,
    {
        let Some(graph) = self.graph.as_ref() else {
            return self.fail("find_path", NavError::GraphNotBuilt);
        };
        let query = configure(PathQuery::new(graph, start, end).with_config(&self.config.search));
        find_path_observed(&query, &mut self.events)
    }

    // ---------------------------------------------------------------- agents

    pub fn agents(&self) -> &AgentManager {
        &self.agents
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.agent(id)
    }

    pub fn register_profile(&mut self, name: impl Into<String>, profile: AgentProfile) -> Result<()> {
        let name = name.into();
        match self.agents.register_profile(name.clone(), profile) {
            Ok(()) => {
                self.events.emit(NavEvent::ProfileRegistered { name });
                Ok(())
            }
            Err(err) => self.fail("register_profile", err),
        }
    }

    /// Derived graph for a registered profile.
    pub fn agent_graph(&mut self, profile_name: &str) -> Result<Arc<Graph>> {
        let Some(graph) = self.graph.as_ref() else {
            return self.fail("agent_graph", NavError::GraphNotBuilt);
        };
        let Some(profile) = self.agents.profile(profile_name).cloned() else {
            let err = NavError::UnknownProfile {
                name: profile_name.to_string(),
            };
            return self.fail("agent_graph", err);
        };
        Ok(self.agents.graph_for(&profile, graph, &self.layers))
    }

    pub fn create_agent(
        &mut self,
        id: impl Into<AgentId>,
        profile_name: &str,
        position: Vec2,
    ) -> Result<AgentId> {
        let Some(graph) = self.graph.as_ref() else {
            return self.fail("create_agent", NavError::GraphNotBuilt);
        };
        let created = self
            .agents
            .create_agent(id, profile_name, position, graph, &self.layers)
            .map(|agent| agent.id().clone());
        match created {
            Ok(agent) => {
                self.events.emit(NavEvent::AgentCreated {
                    agent: agent.clone(),
                });
                Ok(agent)
            }
            Err(err) => self.fail("create_agent", err),
        }
    }

    pub fn remove_agent(&mut self, id: &AgentId) -> Option<Agent> {
        self.agents.remove_agent(id)
    }

    /// Sets a target and plans towards it; emits agent-path-updated on success.
    pub fn set_agent_target(
        &mut self,
        id: &AgentId,
        target: Vec2,
        partial: bool,
    ) -> Result<PathResult> {
        let Some(graph) = self.graph.as_ref() else {
            return self.fail("set_agent_target", NavError::GraphNotBuilt);
        };
        match self
            .agents
            .set_agent_target(id, target, partial, graph, &self.layers)
        {
            Ok(result) => {
                self.events.emit(NavEvent::AgentPathUpdated {
                    agent: id.clone(),
                    points: result.points.clone(),
                });
                Ok(result)
            }
            Err(err) => self.fail("set_agent_target", err),
        }
    }

    /// Re-plans towards the agent's current target, if it has one.
    pub fn recalculate_agent_path(
        &mut self,
        id: &AgentId,
        partial: bool,
    ) -> Result<Option<PathResult>> {
        let Some(graph) = self.graph.as_ref() else {
            return self.fail("recalculate_agent_path", NavError::GraphNotBuilt);
        };
        match self.agents.recalculate_path(id, partial, graph, &self.layers) {
            Ok(Some(result)) => {
                self.events.emit(NavEvent::AgentPathUpdated {
                    agent: id.clone(),
                    points: result.points.clone(),
                });
                Ok(Some(result))
            }
            Ok(None) => Ok(None),
            Err(err) => self.fail("recalculate_agent_path", err),
        }
    }

    /// Moves the agent `step` units along its path and emits agent-updated.
    pub fn update_agent(&mut self, id: &AgentId, step: f64) -> Result<Vec2> {
        match self.agents.update_agent(id, step) {
            Ok(position) => {
                self.events.emit(NavEvent::AgentUpdated {
                    agent: id.clone(),
                    position,
                });
                Ok(position)
            }
            Err(err) => self.fail("update_agent", err),
        }
    }
}

/// Logs a failed operation and reports it on `events`, handing the error back.
fn report(events: &mut EventBus, operation: &'static str, err: NavError) -> NavError {
    tracing::warn!(operation, error = %err, "navmesh operation failed");
    events.emit(NavEvent::Error {
        operation,
        message: err.to_string(),
    });
    err
}
