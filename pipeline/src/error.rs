use thiserror::Error;

/// Errors inside the query pipeline.
///
/// None of these escape [`crate::QueryPipeline::run`]: any step failure is
/// converted into a terminal [`crate::QueryResult`] flagged with `error`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] graphqa_retrieval::RetrievalError),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
