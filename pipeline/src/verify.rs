use crate::answer::RelationshipClaim;
use futures::future::join_all;
use graphqa_graph_store::GraphStore;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one verification pass
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    /// No claim was left unverified
    pub verified: bool,

    /// verified / total; 1.0 when there was nothing to check
    pub success_rate: f64,

    /// One entry per unverified claim
    pub errors: Vec<String>,
}

/// Checks generated relationship claims against the graph.
///
/// Every check is a read-only edge-existence lookup with its own timeout.
/// A check that errors or times out marks its claim unverified (fail-closed)
/// without failing the step.
pub struct VerificationService {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
}

impl VerificationService {
    /// Create a new verification service
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Check every claim, updating each claim's `verified` flag in place
    pub async fn verify_claims(&self, claims: &mut [RelationshipClaim]) -> VerificationReport {
        if claims.is_empty() {
            // Vacuously true: an answer that asserts nothing contradicts
            // nothing.
            return VerificationReport {
                verified: true,
                success_rate: 1.0,
                errors: Vec::new(),
            };
        }

        let checks = claims.iter().map(|claim| self.check_claim(claim));
        let outcomes = join_all(checks).await;

        let mut errors = Vec::new();
        let mut verified_count = 0usize;
        for (claim, outcome) in claims.iter_mut().zip(outcomes) {
            match outcome {
                ClaimOutcome::Supported => {
                    claim.verified = true;
                    verified_count += 1;
                }
                ClaimOutcome::Unsupported => {
                    claim.verified = false;
                    errors.push(format!(
                        "Unsupported relationship: {} -[{}]-> {}",
                        claim.from_component, claim.relationship_type, claim.to_component
                    ));
                }
                ClaimOutcome::CheckFailed(reason) => {
                    claim.verified = false;
                    errors.push(format!(
                        "Could not verify {} -[{}]-> {}: {reason}",
                        claim.from_component, claim.relationship_type, claim.to_component
                    ));
                }
            }
        }

        let report = VerificationReport {
            verified: errors.is_empty(),
            success_rate: verified_count as f64 / claims.len() as f64,
            errors,
        };
        debug!(
            "Verified {verified_count}/{} claims (success rate {:.2})",
            claims.len(),
            report.success_rate
        );
        report
    }

    async fn check_claim(&self, claim: &RelationshipClaim) -> ClaimOutcome {
        let check = self.store.edge_exists(
            &claim.from_component,
            &claim.to_component,
            &claim.relationship_type,
        );
        match tokio::time::timeout(self.timeout, check).await {
            Ok(Ok(true)) => ClaimOutcome::Supported,
            Ok(Ok(false)) => ClaimOutcome::Unsupported,
            Ok(Err(e)) => {
                warn!("Claim check failed, marking unverified: {e}");
                ClaimOutcome::CheckFailed(e.to_string())
            }
            Err(_) => {
                warn!("Claim check timed out after {:?}", self.timeout);
                ClaimOutcome::CheckFailed("timed out".to_string())
            }
        }
    }
}

enum ClaimOutcome {
    Supported,
    Unsupported,
    CheckFailed(String),
}
