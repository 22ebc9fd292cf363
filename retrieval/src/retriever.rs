use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::expand::GraphExpander;
use crate::fusion::ResultCombiner;
use crate::interfaces::{EmbeddingModel, EntityExtractor};
use crate::rerank::ReRanker;
use crate::result::{RankedResult, RetrievalResult, RetrievalStats};
use crate::scorer::NodeScorer;
use crate::search::ParallelSearchExecutor;
use graphqa_graph_store::{GraphStore, NodeId, SearchTerms};
use log::{debug, info, warn};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Hybrid retrieval engine: parallel lexical+vector search, score fusion,
/// bounded graph expansion, structural scoring, and semantic re-ranking,
/// assembled into one [`RetrievalResult`].
pub struct HybridRetriever {
    config: RetrievalConfig,
    extractor: Arc<dyn EntityExtractor>,
    embedder: Arc<dyn EmbeddingModel>,
    searcher: ParallelSearchExecutor,
    combiner: ResultCombiner,
    expander: GraphExpander,
    scorer: NodeScorer,
    reranker: ReRanker,
    cache: Arc<RwLock<LruCache<String, RetrievalResult>>>,
}

impl HybridRetriever {
    /// Create a new retriever over a graph store and its collaborators
    pub fn new(
        config: RetrievalConfig,
        store: Arc<dyn GraphStore>,
        extractor: Arc<dyn EntityExtractor>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        info!("Initializing hybrid retriever ({:?})", config.search_mode);

        let profile = config.search_mode.profile(&config);
        let searcher = ParallelSearchExecutor::new(
            store.clone(),
            profile,
            config.candidate_pool_size,
            Duration::from_millis(config.search_timeout_ms),
        );
        let combiner = ResultCombiner::new(profile);
        let expander = GraphExpander::new(
            store.clone(),
            config.expansion_depth,
            config.expansion_cap,
            Duration::from_millis(config.expand_timeout_ms),
        );
        let reranker = ReRanker::new(config.relevance_floor);

        let cache_size = if config.enable_cache {
            NonZeroUsize::new(config.cache_size)
                .ok_or_else(|| RetrievalError::Cache("Invalid cache size".to_string()))?
        } else {
            NonZeroUsize::MIN
        };

        Ok(Self {
            config,
            extractor,
            embedder,
            searcher,
            combiner,
            expander,
            scorer: NodeScorer::new(),
            reranker,
            cache: Arc::new(RwLock::new(LruCache::new(cache_size))),
        })
    }

    /// Retrieve the subgraph most relevant to a natural-language query
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let start = Instant::now();

        if self.config.enable_cache {
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.get(query) {
                info!("Cache hit for query: '{query}'");
                let mut result = cached.clone();
                result.stats.cache_hit = true;
                result.stats.total_time_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
        }

        let mut stats = RetrievalStats::default();

        // External collaborators degrade rather than abort: a query with no
        // extracted terms still has its embedding, and vice versa.
        let terms = match self.extractor.extract(query).await {
            Ok(terms) => terms,
            Err(e) => {
                warn!("Entity extraction failed, continuing without terms: {e}");
                stats.extraction_degraded = true;
                SearchTerms::default()
            }
        };

        let embedding = match self.embedder.embed(query).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("Query embedding failed, continuing lexical-only: {e}");
                stats.embedding_degraded = true;
                None
            }
        };

        // Losing one signal degrades; losing both leaves nothing to search
        // with, which is a terminal condition for this query.
        if stats.extraction_degraded && stats.embedding_degraded {
            return Err(RetrievalError::Extraction(
                "both entity extraction and query embedding failed".to_string(),
            ));
        }

        let search_start = Instant::now();
        let outcome = self.searcher.search(&terms, embedding.as_deref()).await;
        stats.search_time_ms = search_start.elapsed().as_millis() as u64;
        stats.lexical_count = outcome.lexical.len();
        stats.vector_count = outcome.vector.len();
        stats.lexical_degraded = outcome.lexical_degraded;
        stats.vector_degraded = outcome.vector_degraded;

        let ranked = self.combiner.combine(&outcome.lexical, &outcome.vector);

        let mut seed_list: Vec<RankedResult> = ranked
            .into_iter()
            .filter(|r| r.combined_score >= self.config.score_threshold)
            .collect();
        seed_list.truncate(self.config.seed_limit);
        debug!("Selected {} seed nodes", seed_list.len());

        let seed_node_ids: Vec<NodeId> = seed_list.iter().map(|r| r.node_id.clone()).collect();
        let seeds: HashMap<NodeId, RankedResult> = seed_list
            .iter()
            .map(|r| (r.node_id.clone(), r.clone()))
            .collect();

        let expand_start = Instant::now();
        let mut expansion = self.expander.expand(&seed_list).await;
        stats.expand_time_ms = expand_start.elapsed().as_millis() as u64;
        stats.expansion_degraded = expansion.degraded;
        stats.nodes_expanded = expansion
            .sub_graph
            .node_count()
            .saturating_sub(seed_list.len());

        let mut importance = self.scorer.score(&expansion, &seeds);
        stats.nodes_pruned = self.reranker.rerank(
            embedding.as_deref(),
            &seeds,
            &mut expansion,
            &mut importance,
        );

        // Final confidence blends the fused search score with structural
        // importance; surviving expansion-only nodes carry an extra discount
        // marking them as inferred context.
        let blend = self.config.seed_blend_weight;
        let score_map: HashMap<NodeId, f64> = importance
            .into_iter()
            .map(|(id, structural)| {
                let score = match seeds.get(&id) {
                    Some(seed) => {
                        blend * seed.combined_score + (1.0 - blend) * structural
                    }
                    None => structural * self.config.expansion_discount,
                };
                (id, score)
            })
            .collect();

        stats.total_time_ms = start.elapsed().as_millis() as u64;

        let result = RetrievalResult {
            query: query.to_string(),
            seed_node_ids,
            seeds,
            sub_graph: expansion.sub_graph,
            score_map,
            stats,
        };

        if self.config.enable_cache {
            let mut cache = self.cache.write().await;
            cache.put(query.to_string(), result.clone());
        }

        info!(
            "Retrieval completed in {}ms: {} seeds, {} nodes",
            result.stats.total_time_ms,
            result.seed_node_ids.len(),
            result.sub_graph.node_count()
        );
        Ok(result)
    }

    /// Clear the query cache
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        info!("Retrieval cache cleared");
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        CacheStats {
            size: cache.len(),
            capacity: cache.cap().get(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}
