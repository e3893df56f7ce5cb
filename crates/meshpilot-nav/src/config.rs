//! Tunables for a [`NavMesh`](crate::NavMesh) and its subsystems.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pathfinder::{Algorithm, DEFAULT_MAX_ITERATIONS};

/// Top-level configuration; every field falls back to its default when omitted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NavMeshConfig {
    /// Dynamic obstacle bookkeeping
    pub obstacles: ObstacleConfig,

    /// Defaults applied to every path query issued through the mesh
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ObstacleConfig {
    /// Side length of a spatial-grid cell, in world units
    #[cfg_attr(feature = "serde", serde(default = "default_cell_size"))]
    pub cell_size: f64,

    /// Remove/restore graph edges as obstacles come and go
    #[cfg_attr(feature = "serde", serde(default = "default_auto_update"))]
    pub auto_update: bool,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            auto_update: default_auto_update(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SearchConfig {
    pub algorithm: Algorithm,

    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,

    /// Return the best partial route when the goal is unreachable
    #[cfg_attr(feature = "serde", serde(default = "default_partial_path"))]
    pub partial_path: bool,

    pub smooth_path: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            max_iterations: default_max_iterations(),
            partial_path: default_partial_path(),
            smooth_path: false,
        }
    }
}

fn default_cell_size() -> f64 {
    100.0
}
fn default_auto_update() -> bool {
    true
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_partial_path() -> bool {
    true
}
