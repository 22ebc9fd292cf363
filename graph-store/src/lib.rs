//! # GraphQA Graph Store
//!
//! Data model and access interface for the code property graph:
//! classes, methods, and packages as nodes; typed relationships as edges;
//! optional vector embeddings on nodes.
//!
//! The [`GraphStore`] trait is the read-only surface the retrieval engine
//! and the verification service consume: lexical search, vector top-K
//! search, bounded traversal, and edge-existence checks. Implementations
//! must tolerate concurrent reads.
//!
//! [`MemoryGraphStore`] is an in-memory reference implementation used by
//! tests and small local graphs.
//!
//! ## Example
//!
//! ```no_run
//! use graphqa_graph_store::{GraphEdge, GraphNode, GraphStore, MemoryGraphStore, NodeKind, SearchTerms};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryGraphStore::new();
//!     store
//!         .add_node(GraphNode::new("m:login", NodeKind::Method).with_property("name", "login"))
//!         .await;
//!
//!     let terms = SearchTerms {
//!         method_names: vec!["login".to_string()],
//!         ..Default::default()
//!     };
//!     let hits = store.lexical_search(&terms, 10).await?;
//!     println!("{} hits", hits.len());
//!     Ok(())
//! }
//! ```

mod error;
mod graph;
mod memory;
mod store;

pub use error::{GraphStoreError, Result};
pub use graph::{GraphEdge, GraphNode, NodeId, NodeKind, SubGraph};
pub use memory::MemoryGraphStore;
pub use store::{GraphStore, SearchHit, SearchSignal, SearchTerms};
