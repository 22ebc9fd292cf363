use async_trait::async_trait;
use graphqa_graph_store::{
    GraphEdge, GraphNode, GraphStore, MemoryGraphStore, NodeKind, SearchTerms,
};
use graphqa_pipeline::{Answerer, PipelineConfig, QueryPipeline, Result as PipelineResult};
use graphqa_retrieval::{
    EmbeddingModel, EntityExtractor, HybridRetriever, Result as RetrievalResult, RetrievalConfig,
    RetrievalError,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const QUERY: &str = "How does login validate credentials?";

struct StaticExtractor;

#[async_trait]
impl EntityExtractor for StaticExtractor {
    async fn extract(&self, _query: &str) -> RetrievalResult<SearchTerms> {
        Ok(SearchTerms {
            method_names: vec!["login".to_string(), "validate".to_string()],
            free_terms: vec!["credentials".to_string()],
            ..Default::default()
        })
    }
}

struct FailingExtractor;

#[async_trait]
impl EntityExtractor for FailingExtractor {
    async fn extract(&self, _query: &str) -> RetrievalResult<SearchTerms> {
        Err(RetrievalError::Extraction("extractor offline".into()))
    }
}

struct StaticEmbedder;

#[async_trait]
impl EmbeddingModel for StaticEmbedder {
    async fn embed(&self, _text: &str) -> RetrievalResult<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingModel for FailingEmbedder {
    async fn embed(&self, _text: &str) -> RetrievalResult<Vec<f32>> {
        Err(RetrievalError::Embedding("embedder offline".into()))
    }
}

/// Answerer returning a fixed completion, counting calls
struct ScriptedAnswerer {
    response: String,
    calls: AtomicUsize,
}

impl ScriptedAnswerer {
    fn new(response: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Answerer for ScriptedAnswerer {
    async fn generate(&self, _prompt: &str) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

struct BrokenAnswerer;

#[async_trait]
impl Answerer for BrokenAnswerer {
    async fn generate(&self, _prompt: &str) -> PipelineResult<String> {
        Err(graphqa_pipeline::PipelineError::Generation(
            "model offline".into(),
        ))
    }
}

const SUPPORTED_ANSWER: &str = r#"{
    "summary": "AuthService.login delegates credential checks to validateCredentials.",
    "claims": [
        {"from_component": "AuthService", "to_component": "login", "relationship_type": "DECLARES"},
        {"from_component": "login", "to_component": "validateCredentials", "relationship_type": "CALLS"}
    ]
}"#;

const UNSUPPORTED_ANSWER: &str = r#"{
    "summary": "login extends Button.",
    "claims": [
        {"from_component": "login", "to_component": "Button", "relationship_type": "EXTENDS"}
    ]
}"#;

const CLAIMLESS_ANSWER: &str = r#"{"summary": "login checks credentials.", "claims": []}"#;

async fn auth_store() -> Arc<MemoryGraphStore> {
    let store = MemoryGraphStore::new();

    store
        .add_node(
            GraphNode::new("m:AuthService.login", NodeKind::Method)
                .with_property("name", "login")
                .with_property("signature", "login(String username, String password)")
                .with_embedding(vec![0.95, 0.1, 0.0]),
        )
        .await;
    store
        .add_node(
            GraphNode::new("m:AuthService.validateCredentials", NodeKind::Method)
                .with_property("name", "validateCredentials")
                .with_embedding(vec![0.9, 0.2, 0.0]),
        )
        .await;
    store
        .add_node(
            GraphNode::new("c:AuthService", NodeKind::Class)
                .with_property("name", "AuthService")
                .with_embedding(vec![0.6, 0.4, 0.0]),
        )
        .await;
    store
        .add_node(
            GraphNode::new("c:Button", NodeKind::Class)
                .with_property("name", "Button")
                .with_embedding(vec![0.0, 0.1, 0.9]),
        )
        .await;

    store
        .add_edge(GraphEdge::new(
            "c:AuthService",
            "m:AuthService.login",
            "DECLARES",
        ))
        .await
        .unwrap();
    store
        .add_edge(GraphEdge::new(
            "c:AuthService",
            "m:AuthService.validateCredentials",
            "DECLARES",
        ))
        .await
        .unwrap();
    store
        .add_edge(GraphEdge::new(
            "m:AuthService.login",
            "m:AuthService.validateCredentials",
            "CALLS",
        ))
        .await
        .unwrap();

    Arc::new(store)
}

fn quiet_config(max_refinements: u32) -> PipelineConfig {
    PipelineConfig {
        max_refinements,
        // Keep generation-call counts attributable to the GENERATE step.
        summarize_context: false,
        ..Default::default()
    }
}

async fn pipeline_with(
    store: Arc<MemoryGraphStore>,
    answerer: Arc<dyn Answerer>,
    config: PipelineConfig,
) -> QueryPipeline {
    let retriever = HybridRetriever::new(
        RetrievalConfig::shallow(),
        store.clone() as Arc<dyn GraphStore>,
        Arc::new(StaticExtractor),
        Arc::new(StaticEmbedder),
    )
    .unwrap();

    QueryPipeline::new(
        config,
        Arc::new(retriever),
        answerer,
        store as Arc<dyn GraphStore>,
    )
    .unwrap()
}

#[test_log::test(tokio::test)]
async fn test_happy_path_verifies_claims() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new(SUPPORTED_ANSWER);
    let pipeline = pipeline_with(store, answerer.clone(), quiet_config(2)).await;

    let result = pipeline.run(QUERY).await;

    assert!(!result.error, "unexpected error: {:?}", result.error_reason);
    assert!(result.metadata.verified);
    assert_eq!(result.metadata.refinement_count, 0);
    assert_eq!(answerer.call_count(), 1);
    assert!(result.claims.iter().all(|c| c.verified));
    assert!(result.verification_errors.is_empty());
    assert!(result.confidence > 0.5);
    assert!(!result.components.is_empty());
    assert_eq!(
        result.metadata.completed_steps.last().map(String::as_str),
        Some("FINALIZE")
    );
}

#[tokio::test]
async fn test_refinement_loop_is_bounded() {
    let store = auth_store().await;
    // Always asserts a relationship the graph does not have, so no amount
    // of refinement can converge.
    let answerer = ScriptedAnswerer::new(UNSUPPORTED_ANSWER);
    let pipeline = pipeline_with(store, answerer.clone(), quiet_config(2)).await;

    let result = pipeline.run(QUERY).await;

    assert!(!result.error);
    assert!(!result.metadata.verified);
    assert_eq!(result.metadata.refinement_count, 2);
    // Initial generate plus one per refinement.
    assert_eq!(answerer.call_count(), 3);
    assert!(!result.verification_errors.is_empty());
    assert!(result.verification_errors[0].contains("login -[EXTENDS]-> Button"));

    let generates = result
        .metadata
        .completed_steps
        .iter()
        .filter(|s| s.as_str() == "GENERATE")
        .count();
    let refines = result
        .metadata
        .completed_steps
        .iter()
        .filter(|s| s.as_str() == "REFINE")
        .count();
    assert_eq!(generates, 3);
    assert_eq!(refines, 2);
    assert_eq!(
        result.metadata.completed_steps.last().map(String::as_str),
        Some("FINALIZE")
    );
}

#[tokio::test]
async fn test_zero_refinement_budget() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new(UNSUPPORTED_ANSWER);
    let pipeline = pipeline_with(store, answerer.clone(), quiet_config(0)).await;

    let result = pipeline.run(QUERY).await;

    assert_eq!(result.metadata.refinement_count, 0);
    assert_eq!(answerer.call_count(), 1);
    assert!(!result.metadata.verified);
}

#[tokio::test]
async fn test_claimless_answer_is_vacuously_verified() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new(CLAIMLESS_ANSWER);
    let pipeline = pipeline_with(store, answerer.clone(), quiet_config(2)).await;

    let result = pipeline.run(QUERY).await;

    assert!(result.metadata.verified);
    assert_eq!(result.metadata.refinement_count, 0);
    assert!(result.claims.is_empty());
    assert!(result.verification_errors.is_empty());
}

#[tokio::test]
async fn test_unparsable_output_degrades() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new("The login method just works, trust me.");
    let pipeline = pipeline_with(store, answerer.clone(), quiet_config(2)).await;

    let result = pipeline.run(QUERY).await;

    assert!(!result.error);
    assert!(result.metadata.degraded_answer);
    assert_eq!(result.summary, "The login method just works, trust me.");
    // A degraded answer asserts nothing, so verification is vacuous and the
    // loop must not spin.
    assert!(result.metadata.verified);
    assert_eq!(result.metadata.refinement_count, 0);
}

#[tokio::test]
async fn test_broken_answerer_still_returns_result() {
    let store = auth_store().await;
    let pipeline = pipeline_with(store, Arc::new(BrokenAnswerer), quiet_config(1)).await;

    let result = pipeline.run(QUERY).await;

    assert!(!result.error);
    assert!(result.metadata.degraded_answer);
    assert!(result.confidence < 0.5);
    assert_eq!(
        result.metadata.completed_steps.last().map(String::as_str),
        Some("FINALIZE")
    );
}

#[tokio::test]
async fn test_total_signal_loss_is_terminal_error() {
    let store = auth_store().await;
    let retriever = HybridRetriever::new(
        RetrievalConfig::shallow(),
        store.clone() as Arc<dyn GraphStore>,
        Arc::new(FailingExtractor),
        Arc::new(FailingEmbedder),
    )
    .unwrap();
    let pipeline = QueryPipeline::new(
        quiet_config(2),
        Arc::new(retriever),
        ScriptedAnswerer::new(SUPPORTED_ANSWER),
        store as Arc<dyn GraphStore>,
    )
    .unwrap();

    let result = pipeline.run(QUERY).await;

    assert!(result.error);
    assert!(result.error_reason.is_some());
    assert_eq!(result.confidence, 0.0);
    // FINALIZE runs even on the error path.
    assert_eq!(
        result.metadata.completed_steps.last().map(String::as_str),
        Some("FINALIZE")
    );
}

#[tokio::test]
async fn test_redistill_on_refine_reruns_distill() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new(UNSUPPORTED_ANSWER);
    let config = PipelineConfig {
        max_refinements: 1,
        summarize_context: false,
        redistill_on_refine: true,
        ..Default::default()
    };
    let pipeline = pipeline_with(store, answerer, config).await;

    let result = pipeline.run(QUERY).await;

    let distills = result
        .metadata
        .completed_steps
        .iter()
        .filter(|s| s.as_str() == "DISTILL")
        .count();
    assert_eq!(distills, 2);
}

#[tokio::test]
async fn test_components_are_typed_and_scored() {
    let store = auth_store().await;
    let answerer = ScriptedAnswerer::new(SUPPORTED_ANSWER);
    let pipeline = pipeline_with(store, answerer, quiet_config(2)).await;

    let result = pipeline.run(QUERY).await;

    let login = result
        .components
        .iter()
        .find(|c| c.name == "login")
        .expect("login component missing");
    assert_eq!(login.kind, graphqa_pipeline::ComponentKind::Method);
    assert!(login.relevance > 0.0);
    assert!(login.signature.as_deref().unwrap_or("").contains("login("));
}
