use serde::{Deserialize, Serialize};

/// Which search signals to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchMode {
    /// Lexical and vector search in parallel, fused (default)
    #[default]
    Hybrid,
    /// Only lexical search (best for exact name lookups)
    LexicalOnly,
    /// Only vector search (best for conceptual queries)
    VectorOnly,
}

/// Precomputed search behavior for a [`SearchMode`].
///
/// Built once from the configuration and looked up at run time instead of
/// branching on the mode in every stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProfile {
    /// Run the lexical branch
    pub run_lexical: bool,

    /// Run the vector branch
    pub run_vector: bool,

    /// Fusion weight for normalized lexical scores
    pub lexical_weight: f64,

    /// Fusion weight for normalized vector scores
    pub vector_weight: f64,

    /// Scale applied to nodes found by a single signal only
    pub single_signal_discount: f64,
}

impl SearchMode {
    /// Resolve this mode against a configuration
    pub fn profile(self, config: &RetrievalConfig) -> SearchProfile {
        match self {
            SearchMode::Hybrid => SearchProfile {
                run_lexical: true,
                run_vector: true,
                lexical_weight: config.lexical_weight,
                vector_weight: config.vector_weight,
                single_signal_discount: config.single_signal_discount,
            },
            SearchMode::LexicalOnly => SearchProfile {
                run_lexical: true,
                run_vector: false,
                lexical_weight: 1.0,
                vector_weight: 0.0,
                single_signal_discount: 1.0,
            },
            SearchMode::VectorOnly => SearchProfile {
                run_lexical: false,
                run_vector: true,
                lexical_weight: 0.0,
                vector_weight: 1.0,
                single_signal_discount: 1.0,
            },
        }
    }
}

/// Configuration for hybrid retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Which search signals to run
    #[serde(default)]
    pub search_mode: SearchMode,

    /// Minimum combined score for a node to become a seed
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Maximum number of seed nodes after thresholding
    #[serde(default = "default_seed_limit")]
    pub seed_limit: usize,

    /// Number of candidates requested from each signal before fusion
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,

    /// Maximum hop depth for graph expansion (0 disables expansion)
    #[serde(default = "default_expansion_depth")]
    pub expansion_depth: u32,

    /// Maximum number of nodes in the expanded subgraph, seeds included
    #[serde(default = "default_expansion_cap")]
    pub expansion_cap: usize,

    /// Fusion weight for normalized lexical scores (0.0 - 1.0)
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,

    /// Fusion weight for normalized vector scores (0.0 - 1.0)
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,

    /// Scale applied to nodes found by only one signal (0.0 - 1.0)
    #[serde(default = "default_single_signal_discount")]
    pub single_signal_discount: f64,

    /// Weight of the combined search score when blending final seed scores;
    /// the structural importance score gets the complement
    #[serde(default = "default_seed_blend_weight")]
    pub seed_blend_weight: f64,

    /// Scale applied to final scores of surviving expansion-only nodes
    #[serde(default = "default_expansion_discount")]
    pub expansion_discount: f64,

    /// Minimum query-to-node similarity for expansion-only nodes to survive
    /// re-ranking
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f64,

    /// Wall-clock timeout per search branch, in milliseconds
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Wall-clock timeout per expansion hop, in milliseconds
    #[serde(default = "default_expand_timeout_ms")]
    pub expand_timeout_ms: u64,

    /// Enable caching of retrieval results
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Cache size (number of queries to cache)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_score_threshold() -> f64 {
    0.1
}

fn default_seed_limit() -> usize {
    10
}

fn default_candidate_pool_size() -> usize {
    50
}

fn default_expansion_depth() -> u32 {
    1
}

fn default_expansion_cap() -> usize {
    25
}

fn default_lexical_weight() -> f64 {
    0.5
}

fn default_vector_weight() -> f64 {
    0.5
}

fn default_single_signal_discount() -> f64 {
    0.85
}

fn default_seed_blend_weight() -> f64 {
    0.6
}

fn default_expansion_discount() -> f64 {
    0.3
}

fn default_relevance_floor() -> f64 {
    0.25
}

fn default_search_timeout_ms() -> u64 {
    2000
}

fn default_expand_timeout_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_cache_size() -> usize {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::Hybrid,
            score_threshold: default_score_threshold(),
            seed_limit: default_seed_limit(),
            candidate_pool_size: default_candidate_pool_size(),
            expansion_depth: default_expansion_depth(),
            expansion_cap: default_expansion_cap(),
            lexical_weight: default_lexical_weight(),
            vector_weight: default_vector_weight(),
            single_signal_discount: default_single_signal_discount(),
            seed_blend_weight: default_seed_blend_weight(),
            expansion_discount: default_expansion_discount(),
            relevance_floor: default_relevance_floor(),
            search_timeout_ms: default_search_timeout_ms(),
            expand_timeout_ms: default_expand_timeout_ms(),
            enable_cache: true,
            cache_size: default_cache_size(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("lexical_weight", self.lexical_weight),
            ("vector_weight", self.vector_weight),
            ("seed_blend_weight", self.seed_blend_weight),
            ("relevance_floor", self.relevance_floor),
            ("score_threshold", self.score_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0.0, 1.0], got {value}"));
            }
        }

        if self.search_mode == SearchMode::Hybrid {
            let total = self.lexical_weight + self.vector_weight;
            if (total - 1.0).abs() > 0.01 {
                return Err(format!(
                    "lexical_weight + vector_weight must sum to 1.0, got {total}"
                ));
            }
        }

        for (name, value) in [
            ("single_signal_discount", self.single_signal_discount),
            ("expansion_discount", self.expansion_discount),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(format!("{name} must be in (0.0, 1.0], got {value}"));
            }
        }

        if self.seed_limit == 0 {
            return Err("seed_limit must be > 0".to_string());
        }

        if self.candidate_pool_size == 0 {
            return Err("candidate_pool_size must be > 0".to_string());
        }

        if self.seed_limit > self.candidate_pool_size {
            return Err(format!(
                "seed_limit ({}) cannot exceed candidate_pool_size ({})",
                self.seed_limit, self.candidate_pool_size
            ));
        }

        if self.expansion_cap == 0 {
            return Err("expansion_cap must be > 0".to_string());
        }

        if self.enable_cache && self.cache_size == 0 {
            return Err("cache_size must be > 0 when caching is enabled".to_string());
        }

        Ok(())
    }

    /// Conservative default: one hop of expansion, equal fusion weights
    pub fn shallow() -> Self {
        Self::default()
    }

    /// Wider context: two hops, larger candidate pool and node cap
    pub fn deep() -> Self {
        Self {
            expansion_depth: 2,
            expansion_cap: 100,
            candidate_pool_size: 100,
            ..Default::default()
        }
    }

    /// Lexical-only retrieval (exact name lookups)
    pub fn lexical() -> Self {
        Self {
            search_mode: SearchMode::LexicalOnly,
            lexical_weight: 1.0,
            vector_weight: 0.0,
            ..Default::default()
        }
    }

    /// Vector-only retrieval (conceptual queries)
    pub fn semantic() -> Self {
        Self {
            search_mode: SearchMode::VectorOnly,
            lexical_weight: 0.0,
            vector_weight: 1.0,
            ..Default::default()
        }
    }
}
