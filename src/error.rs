//! Error types for the post-processing engine

use thiserror::Error;

/// Main error type for post-processing operations
#[derive(Error, Debug)]
pub enum PostError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Degenerate coordinate frame: {0}")]
    DegenerateFrame(String),

    #[error("Reference node not found: {0}")]
    ReferenceNodeNotFound(String),

    #[error("Frame or array length mismatch: {left} vs {right}")]
    FrameCountMismatch { left: usize, right: usize },

    #[error("Malformed joint record: {0}")]
    JointRecordParse(String),

    #[error("Interpolation failed: {0}")]
    Interpolation(String),

    #[error("Node {0} not found in node set")]
    NodeNotFound(i64),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for post-processing operations
pub type PostResult<T> = Result<T, PostError>;
