//! Serializable summaries printed by the CLI, as text or JSON.

use std::fmt;

use meshpilot::geom::Vec2;
use meshpilot::nav::{Graph, NavMesh, NodeId, PathResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub layer: String,
    pub centroid: Vec2,
    pub neighbors: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeReport {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub nodes: Vec<NodeReport>,
    pub edges: Vec<EdgeReport>,
    pub obstacles: usize,
    pub blocked_edges: usize,
}

impl GraphReport {
    pub fn new(mesh: &NavMesh, graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeReport {
                id: node.id,
                layer: node.layer().to_string(),
                centroid: node.centroid(),
                neighbors: graph.neighbors(node.id).iter().map(|e| e.to).collect(),
            })
            .collect();
        let edges = graph
            .edges()
            .map(|e| EdgeReport {
                from: e.from,
                to: e.to,
                weight: e.weight,
            })
            .collect();
        Self {
            nodes,
            edges,
            obstacles: mesh.obstacles().obstacle_count(),
            blocked_edges: mesh.obstacles().blocked_edge_count(),
        }
    }
}

impl fmt::Display for GraphReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Graph: {} nodes, {} edges ({} blocked by {} obstacles)",
            self.nodes.len(),
            self.edges.len(),
            self.blocked_edges,
            self.obstacles
        )?;
        for node in &self.nodes {
            let neighbors: Vec<String> = node.neighbors.iter().map(ToString::to_string).collect();
            writeln!(
                f,
                "  [{}] {:<10} ({:.3}, {:.3}) -> {}",
                node.id,
                node.layer,
                node.centroid.x,
                node.centroid.y,
                if neighbors.is_empty() {
                    "-".to_string()
                } else {
                    neighbors.join(", ")
                }
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PathReport {
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(flatten)]
    pub result: PathResult,
}

impl fmt::Display for PathReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.result;
        let status = if r.complete {
            "complete"
        } else if r.is_empty() {
            "no path"
        } else {
            "partial"
        };
        write!(f, "Path ({}", self.algorithm)?;
        if let Some(profile) = &self.profile {
            write!(f, ", profile {profile}")?;
        }
        writeln!(
            f,
            "): {status}, {} nodes, distance {:.3}, {} iterations ({:?})",
            r.nodes.len(),
            r.distance,
            r.iterations,
            r.termination
        )?;
        for (id, p) in r.nodes.iter().zip(&r.points) {
            writeln!(f, "  {id:>4}  ({:.3}, {:.3})", p.x, p.y)?;
        }
        Ok(())
    }
}
