use crate::expand::Expansion;
use crate::result::RankedResult;
use graphqa_graph_store::NodeId;
use log::debug;
use std::collections::HashMap;

/// Precision pass over the expanded subgraph.
///
/// Expansion is breadth-oriented and pulls in weakly related neighbors;
/// the re-ranker measures each node's own embedding against the query and
/// prunes expansion-only nodes below the relevance floor. Seed nodes always
/// survive, whatever their post-expansion similarity. Nodes without an
/// embedding cannot be judged and are kept.
pub struct ReRanker {
    relevance_floor: f64,
}

impl ReRanker {
    /// Create a new re-ranker
    pub fn new(relevance_floor: f64) -> Self {
        Self { relevance_floor }
    }

    /// Prune irrelevant expansion-only nodes in place.
    ///
    /// Returns the number of nodes removed.
    pub fn rerank(
        &self,
        query_embedding: Option<&[f32]>,
        seeds: &HashMap<NodeId, RankedResult>,
        expansion: &mut Expansion,
        scores: &mut HashMap<NodeId, f64>,
    ) -> usize {
        let Some(query_embedding) = query_embedding else {
            debug!("No query embedding, skipping re-ranking");
            return 0;
        };

        let mut pruned: Vec<NodeId> = Vec::new();
        for node in expansion.sub_graph.nodes() {
            if seeds.contains_key(&node.id) {
                continue;
            }
            let Some(embedding) = node.embedding.as_ref() else {
                continue;
            };
            let relevance = f64::from(cosine_similarity(query_embedding, embedding));
            if relevance < self.relevance_floor {
                pruned.push(node.id.clone());
            }
        }

        if pruned.is_empty() {
            return 0;
        }

        let removed: std::collections::HashSet<&NodeId> = pruned.iter().collect();
        expansion
            .sub_graph
            .retain_nodes(|id| !removed.contains(id));
        for id in &pruned {
            scores.remove(id);
            expansion.hops.remove(id);
        }

        debug!("Re-ranking pruned {} expansion nodes", pruned.len());
        pruned.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphqa_graph_store::{GraphNode, NodeKind};
    use pretty_assertions::assert_eq;

    fn ranked(id: &str, score: f64) -> RankedResult {
        RankedResult {
            node_id: NodeId::from(id),
            lexical_score: score,
            vector_score: score,
            combined_score: score,
        }
    }

    fn fixture() -> (Expansion, HashMap<NodeId, RankedResult>, HashMap<NodeId, f64>) {
        let mut expansion = Expansion::default();
        // Seed pointing away from the query; must survive regardless.
        expansion.sub_graph.insert_node(
            GraphNode::new("seed", NodeKind::Method)
                .with_property("name", "seed")
                .with_embedding(vec![0.0, 1.0]),
        );
        expansion.sub_graph.insert_node(
            GraphNode::new("relevant", NodeKind::Class)
                .with_property("name", "relevant")
                .with_embedding(vec![1.0, 0.1]),
        );
        expansion.sub_graph.insert_node(
            GraphNode::new("noise", NodeKind::Class)
                .with_property("name", "noise")
                .with_embedding(vec![-1.0, 0.0]),
        );
        expansion.sub_graph.insert_node(
            GraphNode::new("unjudgeable", NodeKind::Class).with_property("name", "unjudgeable"),
        );
        expansion.hops.insert(NodeId::from("seed"), 0);
        expansion.hops.insert(NodeId::from("relevant"), 1);
        expansion.hops.insert(NodeId::from("noise"), 1);
        expansion.hops.insert(NodeId::from("unjudgeable"), 1);

        let seeds: HashMap<NodeId, RankedResult> = [ranked("seed", 0.9)]
            .into_iter()
            .map(|r| (r.node_id.clone(), r))
            .collect();

        let scores: HashMap<NodeId, f64> = expansion
            .sub_graph
            .nodes()
            .map(|n| (n.id.clone(), 0.5))
            .collect();

        (expansion, seeds, scores)
    }

    #[test]
    fn test_prunes_low_relevance_expansion_nodes() {
        let (mut expansion, seeds, mut scores) = fixture();
        let reranker = ReRanker::new(0.25);

        let pruned = reranker.rerank(Some(&[1.0, 0.0]), &seeds, &mut expansion, &mut scores);

        assert_eq!(pruned, 1);
        assert!(!expansion.sub_graph.contains(&NodeId::from("noise")));
        assert!(!scores.contains_key(&NodeId::from("noise")));
        assert!(expansion.sub_graph.contains(&NodeId::from("relevant")));
    }

    #[test]
    fn test_seeds_always_survive() {
        let (mut expansion, seeds, mut scores) = fixture();
        // Floor higher than any similarity: everything judgeable but seeds
        // goes away.
        let reranker = ReRanker::new(0.99);

        reranker.rerank(Some(&[1.0, 0.0]), &seeds, &mut expansion, &mut scores);

        assert!(expansion.sub_graph.contains(&NodeId::from("seed")));
        assert!(!expansion.sub_graph.contains(&NodeId::from("relevant")));
    }

    #[test]
    fn test_nodes_without_embedding_kept() {
        let (mut expansion, seeds, mut scores) = fixture();
        let reranker = ReRanker::new(0.99);

        reranker.rerank(Some(&[1.0, 0.0]), &seeds, &mut expansion, &mut scores);

        assert!(expansion.sub_graph.contains(&NodeId::from("unjudgeable")));
    }

    #[test]
    fn test_no_query_embedding_skips() {
        let (mut expansion, seeds, mut scores) = fixture();
        let reranker = ReRanker::new(0.99);

        let pruned = reranker.rerank(None, &seeds, &mut expansion, &mut scores);

        assert_eq!(pruned, 0);
        assert_eq!(expansion.sub_graph.node_count(), 4);
    }
}
