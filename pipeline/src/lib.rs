/*!
# GraphQA Pipeline

Query processing over the hybrid retrieval engine: a state machine
(RETRIEVE → DISTILL → GENERATE → VERIFY → {REFINE → GENERATE → VERIFY}* →
FINALIZE) with a bounded, self-correcting refinement loop.

- **DISTILL** compresses the retrieved subgraph into a context block
  (optionally model-summarized).
- **GENERATE** asks the answer model for a JSON answer with relationship
  claims; unusable output becomes a flagged fallback answer.
- **VERIFY** checks every claim against the graph (read-only, per-claim
  timeout, fail-closed).
- **REFINE** feeds unsupported claims back into generation, at most
  `max_refinements` times.
- **FINALIZE** always runs and stamps processing time, the completed-step
  trail, the refinement count, and the final verified flag.

[`QueryPipeline::run`] always returns a [`QueryResult`]. Partial failures
show up as reduced confidence and metadata flags; only total inability to
produce a result yields `error = true`, still as a normal return value.
*/

mod answer;
mod config;
mod context;
mod distill;
mod error;
mod pipeline;
mod prompts;
mod result;
mod verify;

pub use answer::{Answerer, GeneratedAnswer, RelationshipClaim};
pub use config::PipelineConfig;
pub use context::{PipelineStep, QueryExecutionContext};
pub use distill::{ContextDistiller, DistilledContext};
pub use error::{PipelineError, Result};
pub use pipeline::QueryPipeline;
pub use result::{ComponentKind, QueryMetadata, QueryResult, RelevantComponent};
pub use verify::{VerificationReport, VerificationService};
