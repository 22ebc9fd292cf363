use crate::error::Result;
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

/// Text-completion collaborator used by the distill, generate, and refine
/// steps.
///
/// The model is treated as opaque: callers send a prompt and get text back.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// A relationship asserted by the generated answer, checked against the
/// graph by the verification service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipClaim {
    /// Name of the source component
    pub from_component: String,

    /// Name of the target component
    pub to_component: String,

    /// Claimed relationship type (e.g. `CALLS`, `DECLARES`)
    pub relationship_type: String,

    /// Set by verification; claims start unverified
    #[serde(default)]
    pub verified: bool,
}

impl RelationshipClaim {
    /// Create an unverified claim
    pub fn new(
        from_component: impl Into<String>,
        to_component: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            from_component: from_component.into(),
            to_component: to_component.into(),
            relationship_type: relationship_type.into(),
            verified: false,
        }
    }
}

/// Parsed output of one generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// Natural-language summary answering the query
    pub summary: String,

    /// Relationship claims the summary relies on
    #[serde(default)]
    pub claims: Vec<RelationshipClaim>,

    /// The model output could not be parsed and this is a fallback
    #[serde(default)]
    pub degraded: bool,
}

impl GeneratedAnswer {
    /// Parse a raw model completion.
    ///
    /// Accepts a bare JSON object or JSON embedded in surrounding prose /
    /// code fences. Unparsable output falls back to a degraded answer that
    /// carries the raw text as its summary and asserts nothing.
    pub fn parse(raw: &str) -> Self {
        if let Some(answer) = Self::try_parse(raw) {
            return answer;
        }

        warn!("Unparsable generation output, substituting degraded answer");
        Self {
            summary: raw.trim().to_string(),
            claims: Vec::new(),
            degraded: true,
        }
    }

    fn try_parse(raw: &str) -> Option<Self> {
        if let Ok(answer) = serde_json::from_str::<Self>(raw.trim()) {
            return Some(answer);
        }

        // Models habitually wrap JSON in prose or ``` fences; try the
        // outermost object.
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&raw[start..=end]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_bare_json() {
        let raw = r#"{"summary": "login calls validateCredentials", "claims": [
            {"from_component": "login", "to_component": "validateCredentials", "relationship_type": "CALLS"}
        ]}"#;

        let answer = GeneratedAnswer::parse(raw);

        assert!(!answer.degraded);
        assert_eq!(answer.summary, "login calls validateCredentials");
        assert_eq!(answer.claims.len(), 1);
        assert!(!answer.claims[0].verified);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Here is the answer:\n```json\n{\"summary\": \"ok\", \"claims\": []}\n```";

        let answer = GeneratedAnswer::parse(raw);

        assert!(!answer.degraded);
        assert_eq!(answer.summary, "ok");
    }

    #[test]
    fn test_unparsable_degrades() {
        let raw = "The login method validates credentials.";

        let answer = GeneratedAnswer::parse(raw);

        assert!(answer.degraded);
        assert_eq!(answer.summary, raw);
        assert!(answer.claims.is_empty());
    }

    #[test]
    fn test_broken_json_degrades() {
        let answer = GeneratedAnswer::parse("{\"summary\": ");
        assert!(answer.degraded);
    }
}
