use crate::config::SearchProfile;
use crate::result::RankedResult;
use graphqa_graph_store::{NodeId, SearchHit};
use log::debug;
use std::collections::HashMap;

/// Fuses lexical and vector hit lists into one deduplicated ranking.
///
/// Scores are max-normalized per signal before fusion. A node found by both
/// signals gets the weighted sum of its normalized scores; a node found by
/// one signal gets that score scaled by the single-signal discount. Output
/// order is combined score descending, ties broken by node id, so identical
/// inputs always produce identical rankings.
pub struct ResultCombiner {
    profile: SearchProfile,
}

impl ResultCombiner {
    /// Create a new combiner
    pub fn new(profile: SearchProfile) -> Self {
        Self { profile }
    }

    /// Fuse both hit lists into ranked results
    pub fn combine(&self, lexical: &[SearchHit], vector: &[SearchHit]) -> Vec<RankedResult> {
        debug!(
            "Fusing {} lexical + {} vector hits",
            lexical.len(),
            vector.len()
        );

        let lexical_max = max_score(lexical);
        let vector_max = max_score(vector);

        let mut merged: HashMap<NodeId, (f64, f64)> = HashMap::new();
        for hit in lexical {
            let normalized = hit.score / lexical_max;
            let entry = merged.entry(hit.node_id.clone()).or_insert((0.0, 0.0));
            entry.0 = entry.0.max(normalized);
        }
        for hit in vector {
            let normalized = hit.score / vector_max;
            let entry = merged.entry(hit.node_id.clone()).or_insert((0.0, 0.0));
            entry.1 = entry.1.max(normalized);
        }

        let mut results: Vec<RankedResult> = merged
            .into_iter()
            .map(|(node_id, (lexical_score, vector_score))| {
                let combined_score = self.combined_score(lexical_score, vector_score);
                RankedResult {
                    node_id,
                    lexical_score,
                    vector_score,
                    combined_score,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });

        debug!("Fusion produced {} ranked results", results.len());
        results
    }

    fn combined_score(&self, lexical: f64, vector: f64) -> f64 {
        if lexical > 0.0 && vector > 0.0 {
            self.profile.lexical_weight * lexical + self.profile.vector_weight * vector
        } else if lexical > 0.0 {
            self.profile.single_signal_discount * lexical
        } else {
            self.profile.single_signal_discount * vector
        }
    }
}

fn max_score(hits: &[SearchHit]) -> f64 {
    hits.iter()
        .map(|h| h.score)
        .fold(0.0, f64::max)
        .max(f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetrievalConfig, SearchMode};
    use graphqa_graph_store::SearchSignal;
    use pretty_assertions::assert_eq;

    fn combiner() -> ResultCombiner {
        ResultCombiner::new(SearchMode::Hybrid.profile(&RetrievalConfig::default()))
    }

    fn lex(id: &str, score: f64) -> SearchHit {
        SearchHit::new(id, score, SearchSignal::Lexical)
    }

    fn vec_hit(id: &str, score: f64) -> SearchHit {
        SearchHit::new(id, score, SearchSignal::Vector)
    }

    #[test]
    fn test_disjoint_lists_keep_every_node() {
        let lexical = vec![lex("a", 1.0), lex("b", 0.5)];
        let vector = vec![vec_hit("c", 0.8), vec_hit("d", 0.4)];

        let results = combiner().combine(&lexical, &vector);

        assert_eq!(results.len(), 4);
        let discount = RetrievalConfig::default().single_signal_discount;
        for result in &results {
            let single = result.lexical_score.max(result.vector_score);
            assert!((result.combined_score - discount * single).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dual_signal_weighted_sum() {
        let lexical = vec![lex("a", 1.0)];
        let vector = vec![vec_hit("a", 0.8)];

        let results = combiner().combine(&lexical, &vector);

        assert_eq!(results.len(), 1);
        // Both normalized to 1.0 (each is its list's max); equal weights.
        assert!((results[0].combined_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_each_signal() {
        // The `z` hits anchor each list's maximum so `a`'s normalized
        // scores move with its raw scores.
        let base = combiner().combine(
            &[lex("a", 0.5), lex("z", 1.0)],
            &[vec_hit("a", 0.5), vec_hit("z", 1.0)],
        );
        let more_lexical = combiner().combine(
            &[lex("a", 0.8), lex("z", 1.0)],
            &[vec_hit("a", 0.5), vec_hit("z", 1.0)],
        );
        let more_vector = combiner().combine(
            &[lex("a", 0.5), lex("z", 1.0)],
            &[vec_hit("a", 0.7), vec_hit("z", 1.0)],
        );

        let score = |results: &[RankedResult]| {
            results
                .iter()
                .find(|r| r.node_id.as_str() == "a")
                .unwrap()
                .combined_score
        };

        assert!(score(&more_lexical) > score(&base));
        assert!(score(&more_vector) > score(&base));
    }

    #[test]
    fn test_deterministic_tie_break_by_node_id() {
        let lexical = vec![lex("b", 0.5), lex("a", 0.5)];

        let results = combiner().combine(&lexical, &[]);

        assert_eq!(results[0].node_id.as_str(), "a");
        assert_eq!(results[1].node_id.as_str(), "b");
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let lexical = vec![lex("a", 0.9), lex("b", 0.7)];
        let vector = vec![vec_hit("b", 0.8), vec_hit("c", 0.6)];

        let first = combiner().combine(&lexical, &vector);
        let second = combiner().combine(&lexical, &vector);

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_inputs() {
        let results = combiner().combine(&[], &[]);
        assert!(results.is_empty());
    }
}
