use crate::config::SearchProfile;
use graphqa_graph_store::{GraphStore, SearchHit, SearchTerms};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Raw output of the two parallel search branches
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Ordered lexical hits (empty when skipped or degraded)
    pub lexical: Vec<SearchHit>,

    /// Ordered vector hits (empty when skipped or degraded)
    pub vector: Vec<SearchHit>,

    /// Lexical branch failed or timed out
    pub lexical_degraded: bool,

    /// Vector branch failed or timed out
    pub vector_degraded: bool,
}

/// Runs lexical and vector search concurrently against the graph store.
///
/// Each branch is bounded by a wall-clock timeout; a failing or timed-out
/// branch degrades to an empty hit list so the other signal still counts.
pub struct ParallelSearchExecutor {
    store: Arc<dyn GraphStore>,
    profile: SearchProfile,
    limit: usize,
    timeout: Duration,
}

impl ParallelSearchExecutor {
    /// Create a new executor
    pub fn new(
        store: Arc<dyn GraphStore>,
        profile: SearchProfile,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            profile,
            limit,
            timeout,
        }
    }

    /// Issue both searches and join the branches
    pub async fn search(&self, terms: &SearchTerms, embedding: Option<&[f32]>) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        let lexical_task = self.lexical_branch(terms);
        let vector_task = self.vector_branch(embedding);
        let (lexical, vector) = tokio::join!(lexical_task, vector_task);

        match lexical {
            BranchResult::Hits(hits) => outcome.lexical = hits,
            BranchResult::Skipped => {}
            BranchResult::Degraded => outcome.lexical_degraded = true,
        }
        match vector {
            BranchResult::Hits(hits) => outcome.vector = hits,
            BranchResult::Skipped => {}
            BranchResult::Degraded => outcome.vector_degraded = true,
        }

        debug!(
            "Parallel search: {} lexical, {} vector hits",
            outcome.lexical.len(),
            outcome.vector.len()
        );
        outcome
    }

    async fn lexical_branch(&self, terms: &SearchTerms) -> BranchResult {
        if !self.profile.run_lexical || terms.is_empty() {
            return BranchResult::Skipped;
        }

        match tokio::time::timeout(self.timeout, self.store.lexical_search(terms, self.limit)).await
        {
            Ok(Ok(hits)) => BranchResult::Hits(hits),
            Ok(Err(e)) => {
                warn!("Lexical search failed, degrading to empty: {e}");
                BranchResult::Degraded
            }
            Err(_) => {
                warn!("Lexical search timed out after {:?}", self.timeout);
                BranchResult::Degraded
            }
        }
    }

    async fn vector_branch(&self, embedding: Option<&[f32]>) -> BranchResult {
        let Some(embedding) = embedding else {
            return BranchResult::Skipped;
        };
        if !self.profile.run_vector || embedding.is_empty() {
            return BranchResult::Skipped;
        }

        match tokio::time::timeout(
            self.timeout,
            self.store.vector_search(embedding, self.limit),
        )
        .await
        {
            Ok(Ok(hits)) => BranchResult::Hits(hits),
            Ok(Err(e)) => {
                warn!("Vector search failed, degrading to empty: {e}");
                BranchResult::Degraded
            }
            Err(_) => {
                warn!("Vector search timed out after {:?}", self.timeout);
                BranchResult::Degraded
            }
        }
    }
}

enum BranchResult {
    Hits(Vec<SearchHit>),
    Skipped,
    Degraded,
}
