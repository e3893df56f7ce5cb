use meshpilot_geom::GeometryError;
use thiserror::Error;

/// Errors surfaced by the navigation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("invalid polygon: {0}")]
    InvalidPolygon(#[from] GeometryError),

    #[error("layer `{layer}` is not registered")]
    UnregisteredLayer { layer: String },

    #[error("layer `{layer}` is already registered")]
    DuplicateLayer { layer: String },

    #[error("unknown layer `{layer}`")]
    UnknownLayer { layer: String },

    #[error("invalid agent profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("agent profile `{name}` is not registered")]
    UnknownProfile { name: String },

    #[error("agent `{id}` does not exist")]
    UnknownAgent { id: String },

    #[error("could not resolve {which} node: {reason}")]
    NodeResolution { which: &'static str, reason: String },

    #[error("unknown search algorithm `{name}`")]
    UnknownAlgorithm { name: String },

    #[error("navigation graph has not been built")]
    GraphNotBuilt,

    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, NavError>;
