use crate::expand::Expansion;
use crate::result::RankedResult;
use graphqa_graph_store::NodeId;
use log::debug;
use std::collections::HashMap;

// Expansion-node scores are scaled below the weakest seed score; hop decay
// alone guarantees strict ordering (hop >= 1 halves the base), the margin
// keeps a gap even at degenerate configurations.
const EXPANSION_MARGIN: f64 = 0.95;
const DEGREE_SATURATION: f64 = 3.0;

/// Assigns an importance score to every node of an expanded subgraph.
///
/// Seed nodes keep their fused search score. Expansion-only nodes are scored
/// from structure alone (hop distance to the nearest seed, local degree) and
/// land strictly below every seed score: direct evidence always outranks
/// inferred context.
pub struct NodeScorer;

impl NodeScorer {
    /// Create a new scorer
    pub fn new() -> Self {
        Self
    }

    /// Compute a score for every node in the expansion
    pub fn score(
        &self,
        expansion: &Expansion,
        seeds: &HashMap<NodeId, RankedResult>,
    ) -> HashMap<NodeId, f64> {
        let min_seed_score = seeds
            .values()
            .filter(|s| expansion.sub_graph.contains(&s.node_id))
            .map(|s| s.combined_score)
            .fold(f64::INFINITY, f64::min);
        let expansion_base = if min_seed_score.is_finite() {
            min_seed_score * EXPANSION_MARGIN
        } else {
            EXPANSION_MARGIN
        };

        let mut scores = HashMap::new();
        for node in expansion.sub_graph.nodes() {
            let score = match seeds.get(&node.id) {
                Some(seed) => seed.combined_score,
                None => {
                    let hops = expansion.hops.get(&node.id).copied().unwrap_or(1).max(1);
                    let degree = expansion.sub_graph.degree(&node.id);
                    expansion_base * Self::structural_weight(hops, degree)
                }
            };
            scores.insert(node.id.clone(), score);
        }

        debug!("Scored {} subgraph nodes", scores.len());
        scores
    }

    /// Proximity-and-connectivity weight in (0.0, 0.5] for hops >= 1
    fn structural_weight(hops: u32, degree: usize) -> f64 {
        let hop_decay = 1.0 / (1.0 + f64::from(hops));
        let degree = degree as f64;
        let degree_factor = 0.5 + 0.5 * (degree / (degree + DEGREE_SATURATION));
        hop_decay * degree_factor
    }
}

impl Default for NodeScorer {
    fn default() -> Self {
        Self::new()
    }
}
