//! Navigation-mesh pathfinding: polygon adjacency graphs, incremental obstacle repair,
//! layer/agent-profile graph derivation, and a multi-algorithm path search.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agents;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod layers;
pub mod navmesh;
pub mod obstacles;
pub mod pathfinder;
pub mod spatial;

pub use agents::{
    profile_signature, Agent, AgentId, AgentManager, AgentProfile, ProfileKey,
    DEFAULT_UNLISTED_TERRAIN_COST,
};
pub use config::{NavMeshConfig, ObstacleConfig, SearchConfig};
pub use error::{NavError, Result};
pub use events::{EventBus, EventKind, GraphChange, ListenerId, NavEvent};
pub use graph::{Graph, GraphEdge, GraphNode, NodeId};
pub use layers::{
    CostModifier, FilterKind, LayerConfig, LayerFilter, LayerSystem, TraversalContext,
};
pub use navmesh::NavMesh;
pub use obstacles::{DynamicObstacleManager, EdgeId, IndexedEdge, ObstacleId};
pub use pathfinder::{
    find_path, find_path_observed, Algorithm, PathEndpoint, PathQuery, PathResult, Termination,
    DEFAULT_MAX_ITERATIONS,
};
pub use spatial::{Cell, SpatialGrid};

pub use meshpilot_geom::{Aabb, GeometryKernel, Polygon, Segment, SegmentIntersector, Vec2};
