use thiserror::Error;

/// Errors raised by graph store backends
#[derive(Debug, Error)]
pub enum GraphStoreError {
    /// A referenced node does not exist in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The underlying backend failed (connection, query, etc.)
    #[error("Graph backend error: {0}")]
    Backend(String),

    /// Invalid input provided to a store operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, GraphStoreError>;
