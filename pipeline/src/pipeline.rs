use crate::answer::{Answerer, GeneratedAnswer};
use crate::config::PipelineConfig;
use crate::context::{PipelineStep, QueryExecutionContext};
use crate::distill::ContextDistiller;
use crate::error::{PipelineError, Result};
use crate::prompts;
use crate::result::{QueryMetadata, QueryResult};
use crate::verify::VerificationService;
use graphqa_graph_store::GraphStore;
use graphqa_retrieval::HybridRetriever;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

const DEGRADED_SUMMARY: &str = "Unable to generate an answer for this query.";

/// The query processing state machine:
/// RETRIEVE → DISTILL → GENERATE → VERIFY → {REFINE → GENERATE → VERIFY}* →
/// FINALIZE.
///
/// The refine loop is an explicit bounded iteration: it runs only while the
/// answer is unverified and the refinement budget remains, so a run always
/// completes within `max_refinements + 1` generate/verify cycles. Any step
/// failure is converted into a terminal, flagged [`QueryResult`];
/// [`QueryPipeline::run`] never raises.
pub struct QueryPipeline {
    config: PipelineConfig,
    retriever: Arc<HybridRetriever>,
    distiller: ContextDistiller,
    answerer: Arc<dyn Answerer>,
    verifier: VerificationService,
}

impl QueryPipeline {
    /// Create a new pipeline over a retriever, an answer model, and the
    /// graph store used for claim verification
    pub fn new(
        config: PipelineConfig,
        retriever: Arc<HybridRetriever>,
        answerer: Arc<dyn Answerer>,
        store: Arc<dyn GraphStore>,
    ) -> Result<Self> {
        config.validate().map_err(PipelineError::InvalidConfig)?;

        let distiller = ContextDistiller::new(
            answerer.clone(),
            config.distill_limit,
            config.summarize_context,
            Duration::from_millis(config.generation_timeout_ms),
        );
        let verifier =
            VerificationService::new(store, Duration::from_millis(config.verification_timeout_ms));

        Ok(Self {
            config,
            retriever,
            distiller,
            answerer,
            verifier,
        })
    }

    /// Process a query to completion.
    ///
    /// Always returns a result; failures come back as a terminal result
    /// with `error` set, never as an `Err`.
    pub async fn run(&self, query: &str) -> QueryResult {
        let mut ctx = QueryExecutionContext::new(query, self.config.max_refinements);
        info!("Pipeline run {} started", ctx.execution_id);

        let outcome = self.execute(&mut ctx).await;
        match outcome {
            Ok(()) => self.finalize(ctx, None),
            Err(e) => {
                warn!("Pipeline run {} failed: {e}", ctx.execution_id);
                self.finalize(ctx, Some(e))
            }
        }
    }

    async fn execute(&self, ctx: &mut QueryExecutionContext) -> Result<()> {
        self.retrieve(ctx).await?;
        self.distill(ctx).await;
        self.generate(ctx).await;
        self.verify(ctx).await;

        while ctx.can_refine() {
            self.refine(ctx).await;
            self.generate(ctx).await;
            self.verify(ctx).await;
        }

        Ok(())
    }

    async fn retrieve(&self, ctx: &mut QueryExecutionContext) -> Result<()> {
        let retrieval = self.retriever.retrieve(&ctx.original_query).await?;
        debug!(
            "Retrieved {} seeds, {} subgraph nodes",
            retrieval.seed_node_ids.len(),
            retrieval.sub_graph.node_count()
        );
        ctx.metadata.insert(
            "retrieval_stats".to_string(),
            serde_json::to_value(&retrieval.stats).unwrap_or(serde_json::Value::Null),
        );
        ctx.retrieval = Some(retrieval);
        ctx.record_step(PipelineStep::Retrieve);
        Ok(())
    }

    async fn distill(&self, ctx: &mut QueryExecutionContext) {
        if let Some(retrieval) = &ctx.retrieval {
            let distilled = self.distiller.distill(&ctx.original_query, retrieval).await;
            if distilled.degraded {
                ctx.metadata.insert(
                    "distill_degraded".to_string(),
                    serde_json::Value::Bool(true),
                );
            }
            ctx.distilled = Some(distilled);
        }
        ctx.record_step(PipelineStep::Distill);
    }

    async fn generate(&self, ctx: &mut QueryExecutionContext) {
        let context_text = ctx
            .distilled
            .as_ref()
            .map(|d| d.effective_context().to_string())
            .unwrap_or_default();
        let feedback = (ctx.refinement_count > 0 && !ctx.verification_errors.is_empty())
            .then_some(ctx.verification_errors.as_slice());
        let prompt = prompts::generation_prompt(&ctx.original_query, &context_text, feedback);

        let timeout = Duration::from_millis(self.config.generation_timeout_ms);
        let answer = match tokio::time::timeout(timeout, self.answerer.generate(&prompt)).await {
            Ok(Ok(raw)) => GeneratedAnswer::parse(&raw),
            Ok(Err(e)) => {
                warn!("Generation failed, substituting degraded answer: {e}");
                Self::degraded_answer()
            }
            Err(_) => {
                warn!("Generation timed out after {timeout:?}");
                Self::degraded_answer()
            }
        };

        ctx.answer = Some(answer);
        ctx.record_step(PipelineStep::Generate);
    }

    async fn verify(&self, ctx: &mut QueryExecutionContext) {
        let report = match ctx.answer.as_mut() {
            Some(answer) => self.verifier.verify_claims(&mut answer.claims).await,
            // No answer at all: nothing is supported, fail closed.
            None => crate::verify::VerificationReport {
                verified: false,
                success_rate: 0.0,
                errors: vec!["No answer was generated".to_string()],
            },
        };

        ctx.verified = report.verified;
        ctx.verification_errors = report.errors;
        ctx.record_step(PipelineStep::Verify);
    }

    async fn refine(&self, ctx: &mut QueryExecutionContext) {
        ctx.refinement_count += 1;
        debug!(
            "Refinement {}/{} for run {}",
            ctx.refinement_count, ctx.max_refinements, ctx.execution_id
        );
        if self.config.redistill_on_refine {
            self.distill(ctx).await;
        }
        ctx.record_step(PipelineStep::Refine);
    }

    fn finalize(&self, ctx: QueryExecutionContext, error: Option<PipelineError>) -> QueryResult {
        ctx.record_step(PipelineStep::Finalize);

        let (summary, claims, degraded_answer) = match &ctx.answer {
            Some(answer) => (
                answer.summary.clone(),
                answer.claims.clone(),
                answer.degraded,
            ),
            None => (String::new(), Vec::new(), false),
        };

        let components = ctx
            .distilled
            .as_ref()
            .map(|d| d.components.clone())
            .unwrap_or_default();

        let confidence = if error.is_some() {
            0.0
        } else {
            self.confidence(&ctx)
        };

        let metadata = QueryMetadata {
            execution_id: ctx.execution_id.to_string(),
            completed_steps: ctx
                .completed_steps()
                .iter()
                .map(ToString::to_string)
                .collect(),
            refinement_count: ctx.refinement_count,
            verified: ctx.verified,
            processing_time_ms: ctx.processing_time_ms(),
            degraded_answer,
            annotations: ctx.metadata.clone(),
        };

        info!(
            "Pipeline run {} finished in {}ms (verified={}, refinements={}, error={})",
            ctx.execution_id,
            metadata.processing_time_ms,
            ctx.verified,
            ctx.refinement_count,
            error.is_some()
        );

        QueryResult {
            query: ctx.original_query,
            summary,
            components,
            claims,
            verification_errors: ctx.verification_errors,
            confidence,
            error: error.is_some(),
            error_reason: error.map(|e| e.to_string()),
            metadata,
        }
    }

    /// Blend retrieval strength, claim verification, and degradation flags
    /// into one confidence figure; no single signal decides it alone.
    fn confidence(&self, ctx: &QueryExecutionContext) -> f64 {
        let retrieval_signal = ctx
            .retrieval
            .as_ref()
            .map(|r| {
                let scores: Vec<f64> = r
                    .seed_node_ids
                    .iter()
                    .filter_map(|id| r.score(id))
                    .collect();
                if scores.is_empty() {
                    0.0
                } else {
                    scores.iter().sum::<f64>() / scores.len() as f64
                }
            })
            .unwrap_or_default();

        let verification_signal = match &ctx.answer {
            Some(answer) if !answer.claims.is_empty() => {
                let verified = answer.claims.iter().filter(|c| c.verified).count();
                verified as f64 / answer.claims.len() as f64
            }
            Some(_) => 1.0,
            None => 0.0,
        };

        let mut confidence = 0.5 * retrieval_signal + 0.5 * verification_signal;
        if ctx.answer.as_ref().is_some_and(|a| a.degraded) {
            confidence *= 0.5;
        }
        if ctx
            .retrieval
            .as_ref()
            .is_some_and(|r| r.stats.lexical_degraded || r.stats.vector_degraded)
        {
            confidence *= 0.9;
        }
        confidence.clamp(0.0, 1.0)
    }

    fn degraded_answer() -> GeneratedAnswer {
        GeneratedAnswer {
            summary: DEGRADED_SUMMARY.to_string(),
            claims: Vec::new(),
            degraded: true,
        }
    }
}
