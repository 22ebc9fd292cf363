use crate::answer::GeneratedAnswer;
use crate::distill::DistilledContext;
use graphqa_retrieval::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

/// A pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStep {
    Retrieve,
    Distill,
    Generate,
    Verify,
    Refine,
    Finalize,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStep::Retrieve => "RETRIEVE",
            PipelineStep::Distill => "DISTILL",
            PipelineStep::Generate => "GENERATE",
            PipelineStep::Verify => "VERIFY",
            PipelineStep::Refine => "REFINE",
            PipelineStep::Finalize => "FINALIZE",
        };
        f.write_str(name)
    }
}

/// State threaded through one pipeline run.
///
/// Created once per incoming query, mutated by each step, and consumed when
/// the final result is assembled. Owned by exactly one run; the
/// completed-steps trail sits behind a mutex because step-completion
/// callbacks can land from concurrent tasks.
#[derive(Debug)]
pub struct QueryExecutionContext {
    /// The incoming natural-language query
    pub original_query: String,

    /// Unique id of this run
    pub execution_id: Uuid,

    /// When the run started
    pub started_at: Instant,

    /// Output of the RETRIEVE step
    pub retrieval: Option<RetrievalResult>,

    /// Output of the DISTILL step
    pub distilled: Option<DistilledContext>,

    /// Output of the most recent GENERATE step
    pub answer: Option<GeneratedAnswer>,

    /// Outcome of the most recent VERIFY step
    pub verified: bool,

    /// Unsupported claims reported by the most recent VERIFY step
    pub verification_errors: Vec<String>,

    /// Number of REFINE iterations taken; monotonic, never exceeds
    /// `max_refinements`
    pub refinement_count: u32,

    /// Refinement budget for this run
    pub max_refinements: u32,

    /// Step-level annotations absorbed along the way (degradation flags,
    /// stage statistics)
    pub metadata: HashMap<String, serde_json::Value>,

    completed_steps: Arc<Mutex<Vec<PipelineStep>>>,
}

impl QueryExecutionContext {
    /// Create a fresh context for a query
    pub fn new(query: impl Into<String>, max_refinements: u32) -> Self {
        Self {
            original_query: query.into(),
            execution_id: Uuid::new_v4(),
            started_at: Instant::now(),
            retrieval: None,
            distilled: None,
            answer: None,
            verified: false,
            verification_errors: Vec::new(),
            refinement_count: 0,
            max_refinements,
            metadata: HashMap::new(),
            completed_steps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a completed step to the trail
    pub fn record_step(&self, step: PipelineStep) {
        if let Ok(mut steps) = self.completed_steps.lock() {
            steps.push(step);
        }
    }

    /// Snapshot of the completed-steps trail, in completion order
    pub fn completed_steps(&self) -> Vec<PipelineStep> {
        self.completed_steps
            .lock()
            .map(|steps| steps.clone())
            .unwrap_or_default()
    }

    /// Whether the refine loop may run another iteration
    pub fn can_refine(&self) -> bool {
        !self.verified && self.refinement_count < self.max_refinements
    }

    /// Wall-clock time since the run started, in milliseconds
    pub fn processing_time_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}
