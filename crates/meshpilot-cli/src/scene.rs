//! YAML scene files: mesh configuration, layers, polygons, obstacles and agent profiles.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use meshpilot::nav::{AgentProfile, LayerConfig, NavMesh, NavMeshConfig, ObstacleId};
use meshpilot::geom::Polygon;
use serde::{Deserialize, Serialize};

/// A complete navigation scene as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Mesh configuration (obstacle grid, search defaults)
    pub config: NavMeshConfig,

    /// Layers to register before any polygon is added
    pub layers: BTreeMap<String, LayerConfig>,

    /// Walkable polygons; node ids follow list order
    pub polygons: Vec<Polygon>,

    /// Static obstacles honoured when the graph is built
    pub obstacles: Vec<Polygon>,

    /// Obstacles added through the dynamic obstacle manager after the build
    pub dynamic_obstacles: Vec<Polygon>,

    /// Named agent profiles
    pub profiles: BTreeMap<String, AgentProfile>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse scene from {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds the mesh, its graph, and registers every profile.
    ///
    /// Returns the ids of the dynamic obstacles in scene order.
    pub fn build(&self) -> Result<(NavMesh, Vec<ObstacleId>)> {
        let mut mesh = NavMesh::with_config(self.config.clone());

        for (name, layer) in &self.layers {
            if name == meshpilot::geom::DEFAULT_LAYER {
                tracing::warn!(layer = %name, "default layer is built in; scene entry ignored");
                continue;
            }
            mesh.register_layer(name.clone(), layer.clone())
                .with_context(|| format!("Failed to register layer `{name}`"))?;
        }
        for (index, polygon) in self.polygons.iter().enumerate() {
            mesh.add_polygon(polygon.clone())
                .with_context(|| format!("Failed to add polygon #{index}"))?;
        }

        if self.obstacles.is_empty() {
            mesh.build_graph();
        } else {
            mesh.build_graph_considering_obstacles(&self.obstacles);
        }

        let mut dynamic = Vec::with_capacity(self.dynamic_obstacles.len());
        for obstacle in &self.dynamic_obstacles {
            dynamic.push(mesh.add_obstacle(obstacle.clone())?);
        }
        for (name, profile) in &self.profiles {
            mesh.register_profile(name.clone(), profile.clone())
                .with_context(|| format!("Failed to register profile `{name}`"))?;
        }

        tracing::info!(
            polygons = mesh.polygons().len(),
            edges = mesh.graph().map_or(0, |g| g.edge_count()),
            dynamic_obstacles = dynamic.len(),
            "Scene loaded"
        );
        Ok((mesh, dynamic))
    }
}
