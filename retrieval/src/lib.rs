/*!
# GraphQA Retrieval

Hybrid retrieval engine over a code property graph, combining:
- **Lexical search** over names, signatures, and text content
- **Vector search** over node embeddings for conceptual similarity
- **Weighted score fusion** with a single-signal discount
- **Bounded graph expansion** for structural context
- **Structural scoring and semantic re-ranking** to keep expansion honest

## Architecture

```text
Query
  ├─> Entity extraction ──> Lexical search ──┐
  └─> Query embedding  ──> Vector search  ──┤  (parallel, per-branch timeout)
                                            └─> Fusion (weighted + discount)
                                                  └─> Threshold + seed limit
                                                        └─> Graph expansion (BFS, capped)
                                                              └─> Node scoring (structural)
                                                                    └─> Re-ranking (semantic floor)
                                                                          └─> RetrievalResult
```

## Degradation

Every external call is bounded by a wall-clock timeout. A failed or
timed-out search branch degrades to an empty hit list; an interrupted
expansion returns the partial subgraph collected so far. Degradation is
recorded in [`RetrievalStats`], never raised as an error.

## Example

```no_run
use graphqa_retrieval::{EntityExtractor, EmbeddingModel, HybridRetriever, RetrievalConfig};
use graphqa_graph_store::MemoryGraphStore;
use std::sync::Arc;

# async fn example(
#     extractor: Arc<dyn EntityExtractor>,
#     embedder: Arc<dyn EmbeddingModel>,
# ) -> anyhow::Result<()> {
let config = RetrievalConfig::shallow();
let store = Arc::new(MemoryGraphStore::new());
let retriever = HybridRetriever::new(config, store, extractor, embedder)?;

let result = retriever.retrieve("How does login validate credentials?").await?;
for id in &result.seed_node_ids {
    println!("{id} (score: {:.2})", result.score(id).unwrap_or_default());
}
# Ok(())
# }
```
*/

mod config;
mod error;
mod expand;
mod fusion;
mod interfaces;
mod rerank;
mod result;
mod retriever;
mod scorer;
mod search;

pub use config::{RetrievalConfig, SearchMode, SearchProfile};
pub use error::{Result, RetrievalError};
pub use expand::{Expansion, GraphExpander};
pub use fusion::ResultCombiner;
pub use interfaces::{EmbeddingModel, EntityExtractor};
pub use rerank::ReRanker;
pub use result::{RankedResult, RetrievalResult, RetrievalStats};
pub use retriever::{CacheStats, HybridRetriever};
pub use scorer::NodeScorer;
pub use search::{ParallelSearchExecutor, SearchOutcome};
