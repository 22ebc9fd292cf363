use crate::error::Result;
use async_trait::async_trait;
use graphqa_graph_store::SearchTerms;

/// Extracts structured code terms from a raw natural-language query.
///
/// Provided by the caller; typically backed by an NER model or a rule set.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract class/method/package names and free terms from `query`
    async fn extract(&self, query: &str) -> Result<SearchTerms>;
}

/// Produces vector embeddings for arbitrary text.
///
/// Provided by the caller; typically backed by a local or remote embedding
/// model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single text into a vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
