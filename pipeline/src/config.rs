use serde::{Deserialize, Serialize};

/// Configuration for the query pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of refine/generate/verify cycles after the first
    /// failed verification
    #[serde(default = "default_max_refinements")]
    pub max_refinements: u32,

    /// Number of top-scored components included in the distilled context
    #[serde(default = "default_distill_limit")]
    pub distill_limit: usize,

    /// Ask the model to summarize the distilled context before generation
    #[serde(default = "default_true")]
    pub summarize_context: bool,

    /// Re-run distillation on every refinement iteration instead of once
    /// up front. Retrieval output cannot change inside the loop, so this
    /// only matters when the context summary should see verification
    /// feedback.
    #[serde(default)]
    pub redistill_on_refine: bool,

    /// Wall-clock timeout per generation call, in milliseconds
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    /// Wall-clock timeout per claim check, in milliseconds
    #[serde(default = "default_verification_timeout_ms")]
    pub verification_timeout_ms: u64,
}

fn default_max_refinements() -> u32 {
    2
}

fn default_distill_limit() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_verification_timeout_ms() -> u64 {
    2_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_refinements: default_max_refinements(),
            distill_limit: default_distill_limit(),
            summarize_context: true,
            redistill_on_refine: false,
            generation_timeout_ms: default_generation_timeout_ms(),
            verification_timeout_ms: default_verification_timeout_ms(),
        }
    }
}

impl PipelineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.distill_limit == 0 {
            return Err("distill_limit must be > 0".to_string());
        }
        if self.generation_timeout_ms == 0 {
            return Err("generation_timeout_ms must be > 0".to_string());
        }
        if self.verification_timeout_ms == 0 {
            return Err("verification_timeout_ms must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig {
            generation_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refinements_allowed() {
        let config = PipelineConfig {
            max_refinements: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
