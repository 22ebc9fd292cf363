//! Prompt builders for the distill, generate, and refine steps.
//!
//! Deliberately plain: a fixed, testable format with a JSON answer
//! contract. Prompt quality tuning belongs to the calling layer.

use std::fmt::Write;

/// Contract appended to every generation prompt
const ANSWER_CONTRACT: &str = r#"Respond with a single JSON object:
{
  "summary": "<answer to the question in plain language>",
  "claims": [
    {"from_component": "<name>", "to_component": "<name>", "relationship_type": "<TYPE>"}
  ]
}
Only assert relationships that the context supports."#;

/// Prompt asking the model to compress retrieved context
pub fn distill_prompt(query: &str, context: &str) -> String {
    format!(
        "Summarize the following codebase context so it answers the question.\n\
         Keep component names and relationships exact.\n\n\
         Question: {query}\n\nContext:\n{context}"
    )
}

/// Prompt asking the model to answer the query from distilled context.
///
/// `feedback` carries unsupported claims from the previous verification
/// pass during refinement.
pub fn generation_prompt(query: &str, context: &str, feedback: Option<&[String]>) -> String {
    let mut prompt = String::new();
    let _ = write!(
        prompt,
        "Answer the question about this codebase using only the context below.\n\n\
         Question: {query}\n\nContext:\n{context}\n"
    );

    if let Some(errors) = feedback {
        if !errors.is_empty() {
            prompt.push_str(
                "\nYour previous answer asserted relationships the code graph does not support:\n",
            );
            for error in errors {
                let _ = writeln!(prompt, "- {error}");
            }
            prompt.push_str("Correct the answer; drop or fix the unsupported claims.\n");
        }
    }

    prompt.push('\n');
    prompt.push_str(ANSWER_CONTRACT);
    prompt
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_generation_prompt_contains_contract() {
        let prompt = generation_prompt("how?", "ctx", None);
        assert!(prompt.contains("\"summary\""));
        assert!(prompt.contains("\"claims\""));
        assert!(prompt.contains("Question: how?"));
    }

    #[test]
    fn test_feedback_included_on_refinement() {
        let errors = vec!["login -[EXTENDS]-> Button".to_string()];
        let prompt = generation_prompt("how?", "ctx", Some(&errors));
        assert!(prompt.contains("login -[EXTENDS]-> Button"));
        assert!(prompt.contains("does not support"));
    }

    #[test]
    fn test_empty_feedback_adds_nothing() {
        let with_none = generation_prompt("q", "c", None);
        let with_empty = generation_prompt("q", "c", Some(&[]));
        assert_eq!(with_none, with_empty);
    }
}
