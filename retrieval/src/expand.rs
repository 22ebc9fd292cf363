use crate::result::RankedResult;
use graphqa_graph_store::{GraphStore, NodeId, SubGraph};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A subgraph built by expansion, plus how it was reached
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// The collected subgraph (seeds and expansion nodes)
    pub sub_graph: SubGraph,

    /// Hop distance from the nearest seed; 0 for seeds themselves
    pub hops: HashMap<NodeId, u32>,

    /// Traversal was interrupted and this is a partial result
    pub degraded: bool,
}

impl Expansion {
    /// Node ids reached only by traversal, never by direct search
    pub fn expansion_only_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .hops
            .iter()
            .filter(|&(_, &hops)| hops > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Bounded breadth-first expansion around the seed nodes.
///
/// Drives [`GraphStore::expand`] one hop at a time so that the node cap and
/// seed-priority policy stay here: when the cap cuts a hop level short,
/// nodes reached from higher-scored seeds win. A store failure or timeout
/// mid-traversal yields the partial subgraph collected so far.
pub struct GraphExpander {
    store: Arc<dyn GraphStore>,
    max_hops: u32,
    cap: usize,
    timeout: Duration,
}

impl GraphExpander {
    /// Create a new expander
    pub fn new(store: Arc<dyn GraphStore>, max_hops: u32, cap: usize, timeout: Duration) -> Self {
        Self {
            store,
            max_hops,
            cap,
            timeout,
        }
    }

    /// Expand around `seeds`, which must be ordered by score descending
    pub async fn expand(&self, seeds: &[RankedResult]) -> Expansion {
        let mut expansion = Expansion::default();
        if seeds.is_empty() || self.cap == 0 {
            return expansion;
        }

        let seed_ids: Vec<NodeId> = seeds.iter().map(|s| s.node_id.clone()).collect();
        let seed_nodes = match tokio::time::timeout(
            self.timeout,
            self.store.fetch_nodes(&seed_ids),
        )
        .await
        {
            Ok(Ok(nodes)) => nodes,
            Ok(Err(e)) => {
                warn!("Seed fetch failed, returning empty expansion: {e}");
                expansion.degraded = true;
                return expansion;
            }
            Err(_) => {
                warn!("Seed fetch timed out after {:?}", self.timeout);
                expansion.degraded = true;
                return expansion;
            }
        };

        // Seeds enter in score order so the cap favors the best of them.
        let by_id: HashMap<&NodeId, _> = seed_nodes.iter().map(|n| (&n.id, n)).collect();
        let mut frontier: Vec<NodeId> = Vec::new();
        for id in &seed_ids {
            if expansion.sub_graph.node_count() >= self.cap {
                break;
            }
            if let Some(node) = by_id.get(id) {
                expansion.sub_graph.insert_node((*node).clone());
                expansion.hops.insert(id.clone(), 0);
                frontier.push(id.clone());
            }
        }

        for hop in 1..=self.max_hops {
            if frontier.is_empty() || expansion.sub_graph.node_count() >= self.cap {
                break;
            }

            let remaining = self.cap - expansion.sub_graph.node_count();
            let hop_result = tokio::time::timeout(
                self.timeout,
                self.store.expand(&frontier, 1, frontier.len() + remaining),
            )
            .await;

            let neighborhood = match hop_result {
                Ok(Ok(sub_graph)) => sub_graph,
                Ok(Err(e)) => {
                    warn!("Expansion interrupted at hop {hop}, keeping partial subgraph: {e}");
                    expansion.degraded = true;
                    break;
                }
                Err(_) => {
                    warn!(
                        "Expansion timed out at hop {hop} after {:?}, keeping partial subgraph",
                        self.timeout
                    );
                    expansion.degraded = true;
                    break;
                }
            };

            frontier = self.absorb_hop(&mut expansion, &neighborhood, &frontier, hop);
        }

        let seed_count = expansion.hops.values().filter(|&&h| h == 0).count();
        debug!(
            "Expansion: {} nodes ({} seeds), {} edges, degraded={}",
            expansion.sub_graph.node_count(),
            seed_count,
            expansion.sub_graph.edge_count(),
            expansion.degraded
        );
        expansion
    }

    /// Merge one hop's neighborhood into the expansion; returns the next
    /// frontier in priority order.
    fn absorb_hop(
        &self,
        expansion: &mut Expansion,
        neighborhood: &SubGraph,
        frontier: &[NodeId],
        hop: u32,
    ) -> Vec<NodeId> {
        // Rank unseen neighbors by the best (lowest) frontier position that
        // reaches them; the frontier is already in seed-priority order.
        let mut origin_rank: HashMap<NodeId, usize> = HashMap::new();
        for (rank, frontier_id) in frontier.iter().enumerate() {
            for edge in neighborhood.edges() {
                let other = if &edge.from == frontier_id {
                    &edge.to
                } else if &edge.to == frontier_id {
                    &edge.from
                } else {
                    continue;
                };
                if !expansion.sub_graph.contains(other) {
                    origin_rank.entry(other.clone()).or_insert(rank);
                }
            }
        }

        let mut candidates: Vec<(usize, NodeId)> = origin_rank
            .into_iter()
            .map(|(id, rank)| (rank, id))
            .collect();
        candidates.sort();

        let mut next_frontier = Vec::new();
        for (_, id) in candidates {
            if expansion.sub_graph.node_count() >= self.cap {
                break;
            }
            if let Some(node) = neighborhood.node(&id) {
                expansion.sub_graph.insert_node(node.clone());
                expansion.hops.insert(id.clone(), hop);
                next_frontier.push(id);
            }
        }

        // Keep every edge whose endpoints both survived the cap.
        for edge in neighborhood.edges() {
            expansion.sub_graph.push_edge(edge.clone());
        }

        next_frontier
    }
}
