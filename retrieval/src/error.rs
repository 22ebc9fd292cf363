use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Graph store error: {0}")]
    Store(#[from] graphqa_graph_store::GraphStoreError),

    #[error("Entity extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Invalid retrieval configuration: {0}")]
    InvalidConfig(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
