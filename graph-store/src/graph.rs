use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Unique identifier of a node in the property graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new node id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of code element a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A class or type declaration
    Class,
    /// A method or function
    Method,
    /// A package/namespace grouping
    Package,
    /// Anything the ingestion layer did not classify
    #[default]
    Unknown,
}

/// A node in the property graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique node id
    pub id: NodeId,

    /// Kind of code element
    pub kind: NodeKind,

    /// Labels attached by the ingestion layer
    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Arbitrary properties (name, signature, text content, ...)
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,

    /// Vector embedding of the node's text content, if vectorized
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl GraphNode {
    /// Create a new node with no labels or properties
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            labels: BTreeSet::new(),
            properties: HashMap::new(),
            embedding: None,
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Attach a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach an embedding vector
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// The `name` property, if present
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }

    /// The `signature` property, if present
    pub fn signature(&self) -> Option<&str> {
        self.properties.get("signature").and_then(|v| v.as_str())
    }
}

/// A directed, typed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id
    pub from: NodeId,

    /// Target node id
    pub to: NodeId,

    /// Relationship type (e.g. `CALLS`, `DECLARES`, `EXTENDS`)
    pub edge_type: String,

    /// Arbitrary edge properties
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl GraphEdge {
    /// Create a new edge with no properties
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, edge_type: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
            properties: HashMap::new(),
        }
    }
}

/// A connected fragment of the property graph.
///
/// Invariant: every edge's endpoints exist in the node set. `push_edge`
/// refuses dangling edges and `retain_nodes` drops edges whose endpoints
/// were removed, so the invariant holds by construction.
#[derive(Debug, Clone, Default)]
pub struct SubGraph {
    nodes: HashMap<NodeId, GraphNode>,
    edges: Vec<GraphEdge>,
    edge_keys: HashSet<(NodeId, NodeId, String)>,
}

impl SubGraph {
    /// Create an empty subgraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any previous node with the same id
    pub fn insert_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Add an edge if both endpoints are present and the edge is new.
    ///
    /// Returns `true` when the edge was added.
    pub fn push_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            return false;
        }
        let key = (edge.from.clone(), edge.to.clone(), edge.edge_type.clone());
        if !self.edge_keys.insert(key) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Whether a node with this id is present
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node by id
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Iterate over all nodes (unordered)
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// All node ids, sorted for deterministic iteration
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All edges
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the subgraph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges touching a node
    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges
            .iter()
            .filter(|e| &e.from == id || &e.to == id)
            .count()
    }

    /// Keep only nodes for which `keep` returns true, dropping edges whose
    /// endpoints were removed
    pub fn retain_nodes(&mut self, mut keep: impl FnMut(&NodeId) -> bool) {
        self.nodes.retain(|id, _| keep(id));
        let nodes = &self.nodes;
        self.edges
            .retain(|e| nodes.contains_key(&e.from) && nodes.contains_key(&e.to));
        self.edge_keys = self
            .edges
            .iter()
            .map(|e| (e.from.clone(), e.to.clone(), e.edge_type.clone()))
            .collect();
    }
}
