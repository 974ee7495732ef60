//! Error types for cashflow

use thiserror::Error;

use crate::graph::NodeType;

/// Main error type for cashflow
#[derive(Error, Debug)]
pub enum CashFlowError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid capacity {capacity} on edge {source_id}->{dest_id}")]
    InvalidCapacity {
        source_id: String,
        dest_id: String,
        capacity: f64,
    },

    #[error("Invalid cost {cost} on edge {source_id}->{dest_id}")]
    InvalidCost {
        source_id: String,
        dest_id: String,
        cost: f64,
    },

    #[error("Negative-cost cycle reachable from {0}")]
    NegativeCycle(String),

    #[error("Number of iterations must be positive, got {0}")]
    InvalidIterations(i64),

    #[error("Need at least one {0} node")]
    MissingNodeClass(NodeType),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cashflow operations
pub type Result<T> = std::result::Result<T, CashFlowError>;
