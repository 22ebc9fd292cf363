use crate::answer::RelationshipClaim;
use graphqa_graph_store::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a component surfaced in a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Method,
    Class,
    Package,
    Other,
}

impl From<NodeKind> for ComponentKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Method => ComponentKind::Method,
            NodeKind::Class => ComponentKind::Class,
            NodeKind::Package => ComponentKind::Package,
            NodeKind::Unknown => ComponentKind::Other,
        }
    }
}

/// A code component relevant to the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantComponent {
    /// Component kind
    pub kind: ComponentKind,

    /// Component name
    pub name: String,

    /// Signature, when the graph has one
    pub signature: Option<String>,

    /// Final relevance score from retrieval
    pub relevance: f64,
}

/// Run metadata stamped by the FINALIZE step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Unique id of the pipeline run
    pub execution_id: String,

    /// Steps completed, in completion order
    pub completed_steps: Vec<String>,

    /// Refinement iterations taken
    pub refinement_count: u32,

    /// Final verification outcome
    pub verified: bool,

    /// Total processing time in milliseconds
    pub processing_time_ms: u64,

    /// The answer is a degraded fallback (generation output was unusable)
    pub degraded_answer: bool,

    /// Step-level annotations (stage statistics, degradation flags)
    #[serde(default)]
    pub annotations: HashMap<String, serde_json::Value>,
}

/// Final result of one pipeline run.
///
/// Always produced, even on failure: degraded quality shows up in
/// `confidence` and `metadata`, a total failure in `error`/`error_reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The incoming query
    pub query: String,

    /// Natural-language answer
    pub summary: String,

    /// Components the answer is grounded on, best first
    pub components: Vec<RelevantComponent>,

    /// Relationship claims with their verification outcome
    pub claims: Vec<RelationshipClaim>,

    /// Unsupported claims from the final verification pass
    pub verification_errors: Vec<String>,

    /// Overall confidence in [0.0, 1.0]
    pub confidence: f64,

    /// The pipeline could not produce a usable answer
    pub error: bool,

    /// Why, when `error` is set
    pub error_reason: Option<String>,

    /// Run metadata
    pub metadata: QueryMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_component_kind_from_node_kind() {
        assert_eq!(ComponentKind::from(NodeKind::Method), ComponentKind::Method);
        assert_eq!(ComponentKind::from(NodeKind::Class), ComponentKind::Class);
        assert_eq!(ComponentKind::from(NodeKind::Unknown), ComponentKind::Other);
    }
}
