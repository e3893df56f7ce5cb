use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("polygon vertex {index} is not finite")]
    NonFiniteVertex { index: usize },

    #[error("polygon traversal cost must be finite and non-negative, got {cost}")]
    InvalidTraversalCost { cost: f64 },
}

pub type Result<T> = std::result::Result<T, GeometryError>;
