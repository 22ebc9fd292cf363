use graphqa_graph_store::{NodeId, SubGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fused search result for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Id of the node
    pub node_id: NodeId,

    /// Normalized lexical score (0.0 when the lexical signal missed)
    pub lexical_score: f64,

    /// Normalized vector score (0.0 when the vector signal missed)
    pub vector_score: f64,

    /// Fused score; monotonic in both component scores
    pub combined_score: f64,
}

/// Stage statistics for one retrieval run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalStats {
    /// Number of raw lexical hits
    pub lexical_count: usize,

    /// Number of raw vector hits
    pub vector_count: usize,

    /// Lexical branch failed or timed out and degraded to empty
    pub lexical_degraded: bool,

    /// Vector branch failed or timed out and degraded to empty
    pub vector_degraded: bool,

    /// Entity extraction failed and degraded to no terms
    pub extraction_degraded: bool,

    /// Query embedding failed; vector search was skipped
    pub embedding_degraded: bool,

    /// Expansion was interrupted and returned a partial subgraph
    pub expansion_degraded: bool,

    /// Nodes added by graph expansion (beyond the seeds)
    pub nodes_expanded: usize,

    /// Expansion-only nodes removed by re-ranking
    pub nodes_pruned: usize,

    /// Result was served from the cache
    pub cache_hit: bool,

    /// Parallel search time in milliseconds
    pub search_time_ms: u64,

    /// Expansion time in milliseconds
    pub expand_time_ms: u64,

    /// Total retrieval time in milliseconds
    pub total_time_ms: u64,
}

/// Output of the hybrid retrieval engine
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    /// Query that produced this result
    pub query: String,

    /// Seed node ids, ordered by combined score descending
    pub seed_node_ids: Vec<NodeId>,

    /// Seed search results keyed by node id
    pub seeds: HashMap<NodeId, RankedResult>,

    /// Expanded subgraph around the seeds
    pub sub_graph: SubGraph,

    /// Final relevance score for every node in `sub_graph`
    pub score_map: HashMap<NodeId, f64>,

    /// Stage statistics
    pub stats: RetrievalStats,
}

impl RetrievalResult {
    /// Whether retrieval found anything at all
    pub fn is_empty(&self) -> bool {
        self.sub_graph.is_empty()
    }

    /// Final score of a node, if it is part of the result
    pub fn score(&self, id: &NodeId) -> Option<f64> {
        self.score_map.get(id).copied()
    }

    /// Whether a node was a direct search hit rather than expansion context
    pub fn is_seed(&self, id: &NodeId) -> bool {
        self.seeds.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_result() {
        let result = RetrievalResult::default();
        assert!(result.is_empty());
        assert_eq!(result.score(&NodeId::from("a")), None);
        assert!(!result.is_seed(&NodeId::from("a")));
    }
}
