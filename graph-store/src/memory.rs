use crate::error::{GraphStoreError, Result};
use crate::graph::{GraphEdge, GraphNode, NodeId, SubGraph};
use crate::store::{GraphStore, SearchHit, SearchSignal, SearchTerms};
use async_trait::async_trait;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

// Match-quality tiers for lexical scoring. Exact name matches always beat
// prefix matches, which beat substring matches, which beat content matches.
const EXACT_MATCH: f64 = 1.0;
const PREFIX_MATCH: f64 = 0.8;
const SUBSTRING_MATCH: f64 = 0.6;
const CONTENT_MATCH: f64 = 0.4;
const EXTRA_TERM_BONUS: f64 = 0.05;

#[derive(Debug, Default)]
struct GraphData {
    nodes: HashMap<NodeId, GraphNode>,
    edges: Vec<GraphEdge>,
    adjacency: HashMap<NodeId, Vec<usize>>,
}

/// In-memory reference implementation of [`GraphStore`].
///
/// Intended for tests and small local graphs; production deployments back
/// the trait with a real graph database.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    data: Arc<RwLock<GraphData>>,
}

impl MemoryGraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing any node with the same id
    pub async fn add_node(&self, node: GraphNode) {
        let mut data = self.data.write().await;
        data.nodes.insert(node.id.clone(), node);
    }

    /// Add an edge. Both endpoints must already exist.
    pub async fn add_edge(&self, edge: GraphEdge) -> Result<()> {
        let mut data = self.data.write().await;
        for endpoint in [&edge.from, &edge.to] {
            if !data.nodes.contains_key(endpoint) {
                return Err(GraphStoreError::NodeNotFound(endpoint.to_string()));
            }
        }
        let index = data.edges.len();
        data.adjacency
            .entry(edge.from.clone())
            .or_default()
            .push(index);
        data.adjacency
            .entry(edge.to.clone())
            .or_default()
            .push(index);
        data.edges.push(edge);
        Ok(())
    }

    /// Number of nodes in the store
    pub async fn node_count(&self) -> usize {
        self.data.read().await.nodes.len()
    }

    fn lexical_score(node: &GraphNode, terms: &SearchTerms) -> f64 {
        let name = node.name().unwrap_or(node.id.as_str()).to_lowercase();
        let mut best: f64 = 0.0;
        let mut hits = 0usize;

        for term in terms.all_terms() {
            let term = term.to_lowercase();
            if term.is_empty() {
                continue;
            }
            let score = if name == term {
                EXACT_MATCH
            } else if name.starts_with(&term) {
                PREFIX_MATCH
            } else if name.contains(&term) {
                SUBSTRING_MATCH
            } else if Self::text_properties_contain(node, &term) {
                CONTENT_MATCH
            } else {
                continue;
            };
            hits += 1;
            best = best.max(score);
        }

        if hits == 0 {
            return 0.0;
        }
        (best + EXTRA_TERM_BONUS * (hits - 1) as f64).min(1.0)
    }

    fn text_properties_contain(node: &GraphNode, term: &str) -> bool {
        node.properties
            .values()
            .filter_map(|v| v.as_str())
            .any(|text| text.to_lowercase().contains(term))
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn lexical_search(&self, terms: &SearchTerms, limit: usize) -> Result<Vec<SearchHit>> {
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let data = self.data.read().await;
        let mut hits: Vec<SearchHit> = data
            .nodes
            .values()
            .filter_map(|node| {
                let score = Self::lexical_score(node, terms);
                (score > 0.0).then(|| SearchHit::new(node.id.clone(), score, SearchSignal::Lexical))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits.truncate(limit);

        debug!("Lexical search matched {} nodes", hits.len());
        Ok(hits)
    }

    async fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        if embedding.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let data = self.data.read().await;
        let mut hits: Vec<SearchHit> = data
            .nodes
            .values()
            .filter_map(|node| {
                let vector = node.embedding.as_ref()?;
                let similarity = cosine_similarity(embedding, vector) as f64;
                (similarity > 0.0)
                    .then(|| SearchHit::new(node.id.clone(), similarity, SearchSignal::Vector))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits.truncate(limit);

        debug!("Vector search matched {} nodes", hits.len());
        Ok(hits)
    }

    async fn fetch_nodes(&self, ids: &[NodeId]) -> Result<Vec<GraphNode>> {
        let data = self.data.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.nodes.get(id).cloned())
            .collect())
    }

    async fn expand(&self, seed_ids: &[NodeId], max_hops: u32, cap: usize) -> Result<SubGraph> {
        let data = self.data.read().await;
        let mut subgraph = SubGraph::new();
        if cap == 0 {
            return Ok(subgraph);
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();

        for id in seed_ids {
            if let Some(node) = data.nodes.get(id) {
                if visited.insert(id.clone()) {
                    subgraph.insert_node(node.clone());
                    queue.push_back((id.clone(), 0));
                    if subgraph.node_count() >= cap {
                        break;
                    }
                }
            }
        }

        'bfs: while let Some((current, hops)) = queue.pop_front() {
            if hops >= max_hops {
                continue;
            }
            let Some(edge_indexes) = data.adjacency.get(&current) else {
                continue;
            };

            // Deterministic neighbor order regardless of insertion order.
            let mut neighbors: Vec<NodeId> = edge_indexes
                .iter()
                .map(|&i| {
                    let edge = &data.edges[i];
                    if edge.from == current {
                        edge.to.clone()
                    } else {
                        edge.from.clone()
                    }
                })
                .collect();
            neighbors.sort();
            neighbors.dedup();

            for neighbor in neighbors {
                if !visited.insert(neighbor.clone()) {
                    continue;
                }
                if let Some(node) = data.nodes.get(&neighbor) {
                    if subgraph.node_count() >= cap {
                        break 'bfs;
                    }
                    subgraph.insert_node(node.clone());
                    queue.push_back((neighbor, hops + 1));
                }
            }
        }

        // Induced edges: every stored edge whose endpoints both survived.
        for edge in &data.edges {
            if subgraph.contains(&edge.from) && subgraph.contains(&edge.to) {
                subgraph.push_edge(edge.clone());
            }
        }

        debug!(
            "Expand from {} seeds: {} nodes, {} edges",
            seed_ids.len(),
            subgraph.node_count(),
            subgraph.edge_count()
        );
        Ok(subgraph)
    }

    async fn edge_exists(&self, from_name: &str, to_name: &str, rel_type: &str) -> Result<bool> {
        let data = self.data.read().await;
        let from = from_name.to_lowercase();
        let to = to_name.to_lowercase();

        let matches_name = |id: &NodeId, wanted: &str| {
            data.nodes
                .get(id)
                .map(|node| {
                    node.name()
                        .unwrap_or(node.id.as_str())
                        .eq_ignore_ascii_case(wanted)
                })
                .unwrap_or(false)
        };

        Ok(data.edges.iter().any(|edge| {
            edge.edge_type.eq_ignore_ascii_case(rel_type)
                && matches_name(&edge.from, &from)
                && matches_name(&edge.to, &to)
        }))
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
    use crate::graph::NodeKind;
    use pretty_assertions::assert_eq;

    async fn create_test_store() -> MemoryGraphStore {
        let store = MemoryGraphStore::new();

        store
            .add_node(
                GraphNode::new("m:login", NodeKind::Method)
                    .with_property("name", "login")
                    .with_property("signature", "login(String, String)")
                    .with_embedding(vec![1.0, 0.0, 0.0]),
            )
            .await;
        store
            .add_node(
                GraphNode::new("m:logout", NodeKind::Method)
                    .with_property("name", "logout")
                    .with_embedding(vec![0.9, 0.1, 0.0]),
            )
            .await;
        store
            .add_node(
                GraphNode::new("c:AuthService", NodeKind::Class)
                    .with_property("name", "AuthService")
                    .with_embedding(vec![0.5, 0.5, 0.0]),
            )
            .await;

        store
            .add_edge(GraphEdge::new("c:AuthService", "m:login", "DECLARES"))
            .await
            .unwrap();
        store
            .add_edge(GraphEdge::new("c:AuthService", "m:logout", "DECLARES"))
            .await
            .unwrap();

        store
    }

    fn terms(free: &[&str]) -> SearchTerms {
        SearchTerms {
            free_terms: free.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_edge_requires_endpoints() {
        let store = MemoryGraphStore::new();
        let result = store.add_edge(GraphEdge::new("a", "b", "CALLS")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lexical_exact_beats_prefix() {
        let store = create_test_store().await;

        let hits = store.lexical_search(&terms(&["login"]), 10).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node_id, NodeId::from("m:login"));
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[1].node_id, NodeId::from("m:logout"));
    }

    #[tokio::test]
    async fn test_lexical_empty_terms() {
        let store = create_test_store().await;
        let hits = store
            .lexical_search(&SearchTerms::default(), 10)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_vector_search_ranks_by_similarity() {
        let store = create_test_store().await;

        let hits = store.vector_search(&[1.0, 0.0, 0.0], 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node_id, NodeId::from("m:login"));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_expand_respects_cap() {
        let store = create_test_store().await;
        let seeds = vec![NodeId::from("m:login")];

        let sg = store.expand(&seeds, 2, 2).await.unwrap();
        assert_eq!(sg.node_count(), 2);

        let sg = store.expand(&seeds, 2, 100).await.unwrap();
        assert_eq!(sg.node_count(), 3);
    }

    #[tokio::test]
    async fn test_expand_zero_hops_returns_seeds_only() {
        let store = create_test_store().await;
        let seeds = vec![NodeId::from("m:login")];

        let sg = store.expand(&seeds, 0, 100).await.unwrap();
        assert_eq!(sg.node_count(), 1);
        assert_eq!(sg.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_expand_edge_integrity() {
        let store = create_test_store().await;
        let seeds = vec![NodeId::from("c:AuthService")];

        let sg = store.expand(&seeds, 1, 100).await.unwrap();
        for edge in sg.edges() {
            assert!(sg.contains(&edge.from));
            assert!(sg.contains(&edge.to));
        }
        assert_eq!(sg.edge_count(), 2);
    }

    #[tokio::test]
    async fn test_edge_exists_by_name() {
        let store = create_test_store().await;

        assert!(store
            .edge_exists("AuthService", "login", "DECLARES")
            .await
            .unwrap());
        assert!(store
            .edge_exists("authservice", "LOGIN", "declares")
            .await
            .unwrap());
        assert!(!store
            .edge_exists("login", "AuthService", "DECLARES")
            .await
            .unwrap());
        assert!(!store
            .edge_exists("AuthService", "login", "CALLS")
            .await
            .unwrap());
    }
}
