use crate::answer::Answerer;
use crate::prompts;
use crate::result::{ComponentKind, RelevantComponent};
use graphqa_graph_store::{GraphNode, NodeId, SubGraph};
use graphqa_retrieval::RetrievalResult;
use log::{debug, warn};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

/// Compressed context handed to the generation step
#[derive(Debug, Clone, Default)]
pub struct DistilledContext {
    /// Formatted context block over the selected components
    pub context_text: String,

    /// Model-written summary of the context, when summarization ran
    pub summary: Option<String>,

    /// Selected components, best first
    pub components: Vec<RelevantComponent>,

    /// Summarization failed and `context_text` stands in unsummarized
    pub degraded: bool,
}

impl DistilledContext {
    /// The text generation should work from
    pub fn effective_context(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.context_text)
    }
}

/// Distills a retrieval result into a compact context block.
///
/// Selects the top-scored subgraph nodes, renders them as a Markdown
/// context block, and optionally asks the model for a summary. A failed or
/// timed-out summarization degrades to the raw block.
pub struct ContextDistiller {
    answerer: Arc<dyn Answerer>,
    limit: usize,
    summarize: bool,
    timeout: Duration,
}

impl ContextDistiller {
    /// Create a new distiller
    pub fn new(answerer: Arc<dyn Answerer>, limit: usize, summarize: bool, timeout: Duration) -> Self {
        Self {
            answerer,
            limit,
            summarize,
            timeout,
        }
    }

    /// Distill a retrieval result for a query
    pub async fn distill(&self, query: &str, retrieval: &RetrievalResult) -> DistilledContext {
        let components = self.select_components(retrieval);
        let context_text = self.format_context(retrieval, &components);
        debug!(
            "Distilled {} components into {} chars of context",
            components.len(),
            context_text.len()
        );

        let mut distilled = DistilledContext {
            context_text,
            summary: None,
            components,
            degraded: false,
        };

        if !self.summarize || distilled.context_text.is_empty() {
            return distilled;
        }

        let prompt = prompts::distill_prompt(query, &distilled.context_text);
        match tokio::time::timeout(self.timeout, self.answerer.generate(&prompt)).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => {
                distilled.summary = Some(summary);
            }
            Ok(Ok(_)) => {
                warn!("Empty distillation summary, keeping raw context");
                distilled.degraded = true;
            }
            Ok(Err(e)) => {
                warn!("Distillation summary failed, keeping raw context: {e}");
                distilled.degraded = true;
            }
            Err(_) => {
                warn!("Distillation summary timed out after {:?}", self.timeout);
                distilled.degraded = true;
            }
        }

        distilled
    }

    /// Pick the top-scored nodes of the subgraph, deterministically
    fn select_components(&self, retrieval: &RetrievalResult) -> Vec<RelevantComponent> {
        let mut scored: Vec<(&GraphNode, f64)> = retrieval
            .sub_graph
            .nodes()
            .map(|node| (node, retrieval.score(&node.id).unwrap_or_default()))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(self.limit);

        scored
            .into_iter()
            .map(|(node, relevance)| RelevantComponent {
                kind: ComponentKind::from(node.kind),
                name: node.name().unwrap_or(node.id.as_str()).to_string(),
                signature: node.signature().map(str::to_string),
                relevance,
            })
            .collect()
    }

    /// Render the selected components and their relationships as Markdown
    fn format_context(
        &self,
        retrieval: &RetrievalResult,
        components: &[RelevantComponent],
    ) -> String {
        if components.is_empty() {
            return String::new();
        }

        let mut formatted = String::from("# Relevant Codebase Context\n\n");
        for (i, component) in components.iter().enumerate() {
            let _ = writeln!(
                formatted,
                "## {}. `{}` ({:?})",
                i + 1,
                component.name,
                component.kind
            );
            if let Some(signature) = &component.signature {
                let _ = writeln!(formatted, "Signature: `{signature}`");
            }
            let _ = writeln!(formatted, "_Relevance: {:.2}_\n", component.relevance);
        }

        if !retrieval.sub_graph.edges().is_empty() {
            formatted.push_str("## Relationships\n");
            for edge in retrieval.sub_graph.edges() {
                let _ = writeln!(
                    formatted,
                    "- {} -[{}]-> {}",
                    display_name(&retrieval.sub_graph, &edge.from),
                    edge.edge_type,
                    display_name(&retrieval.sub_graph, &edge.to)
                );
            }
        }

        formatted
    }
}

fn display_name<'a>(sub_graph: &'a SubGraph, id: &'a NodeId) -> &'a str {
    sub_graph
        .node(id)
        .and_then(GraphNode::name)
        .unwrap_or(id.as_str())
}
