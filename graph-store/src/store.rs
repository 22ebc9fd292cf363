use crate::error::Result;
use crate::graph::{GraphNode, NodeId, SubGraph};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which search signal produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchSignal {
    /// Keyword/name matching over names, signatures, text content
    Lexical,
    /// Nearest-neighbor match in embedding space
    Vector,
}

/// A single raw hit from one search signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Id of the matched node
    pub node_id: NodeId,

    /// Signal-local relevance score (higher is better)
    pub score: f64,

    /// Signal that produced this hit
    pub signal: SearchSignal,
}

impl SearchHit {
    /// Create a new hit
    pub fn new(node_id: impl Into<NodeId>, score: f64, signal: SearchSignal) -> Self {
        Self {
            node_id: node_id.into(),
            score,
            signal,
        }
    }
}

/// Structured terms extracted from a natural-language query.
///
/// Produced by an external entity extractor and consumed by
/// [`GraphStore::lexical_search`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTerms {
    /// Mentioned class names
    #[serde(default)]
    pub class_names: Vec<String>,

    /// Mentioned method names
    #[serde(default)]
    pub method_names: Vec<String>,

    /// Mentioned package names
    #[serde(default)]
    pub package_names: Vec<String>,

    /// Remaining free-text terms
    #[serde(default)]
    pub free_terms: Vec<String>,
}

impl SearchTerms {
    /// Whether no terms were extracted at all
    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
            && self.method_names.is_empty()
            && self.package_names.is_empty()
            && self.free_terms.is_empty()
    }

    /// All terms in a fixed order: classes, methods, packages, free terms
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.class_names
            .iter()
            .chain(self.method_names.iter())
            .chain(self.package_names.iter())
            .chain(self.free_terms.iter())
            .map(String::as_str)
    }
}

/// Read-only interface to the property graph.
///
/// Implementations must be safe for concurrent reads; the retrieval path
/// never writes through this trait.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Keyword search over node names, signatures, and text content
    async fn lexical_search(&self, terms: &SearchTerms, limit: usize) -> Result<Vec<SearchHit>>;

    /// Cosine top-K search over node embeddings
    async fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Fetch nodes by id. Unknown ids are skipped, not errors.
    async fn fetch_nodes(&self, ids: &[NodeId]) -> Result<Vec<GraphNode>>;

    /// Multi-hop traversal from `seed_ids`, at most `max_hops` hops out,
    /// returning at most `cap` nodes (seed nodes included in the count)
    async fn expand(&self, seed_ids: &[NodeId], max_hops: u32, cap: usize) -> Result<SubGraph>;

    /// Whether an edge of `rel_type` exists from the component named
    /// `from_name` to the component named `to_name`
    async fn edge_exists(&self, from_name: &str, to_name: &str, rel_type: &str) -> Result<bool>;
}
