//! The intent classifier.
//!
//! File presence forces the document label deterministically; otherwise the
//! model is consulted under a short deadline and any failure degrades to the
//! out-of-scope label.

use std::sync::Arc;
use std::time::Duration;

use switchboard_core::{Capability, ClassificationResult, ClassificationSource};

use crate::model::IntentModel;

/// Classifies incoming messages into capability labels.
///
/// Stateless between calls: each turn is classified independently, without
/// session history, which keeps routing decisions explainable and
/// reproducible.
pub struct Classifier {
    model: Arc<dyn IntentModel>,
    timeout: Duration,
}

impl Classifier {
    /// Create a classifier over the given model with a per-call deadline.
    pub fn new(model: Arc<dyn IntentModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Classify one message.
    ///
    /// Never fails: a model timeout, transport error, or unrecognized reply
    /// degrades to [`Capability::OutOfScope`] rather than aborting the turn.
    pub async fn classify(&self, text: &str, has_file: bool) -> ClassificationResult {
        // File presence is an unambiguous, higher-priority signal than text
        // content; skip the model entirely.
        if has_file {
            return ClassificationResult::forced_by_file();
        }

        let prompt = build_prompt(text);
        let reply = match tokio::time::timeout(self.timeout, self.model.complete(&prompt)).await
        {
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classification timed out"
                );
                return ClassificationResult::fallback("classification timed out");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Classification call failed");
                return ClassificationResult::fallback(e.to_string());
            }
            Ok(Ok(reply)) => reply,
        };

        match parse_label(&reply) {
            Some(Capability::Document) => {
                // The model can only justify the document label when a file
                // is actually attached.
                tracing::debug!("Document label without an uploaded file; deflecting");
                ClassificationResult::fallback("document label without an uploaded file")
            }
            Some(capability) => {
                tracing::debug!(%capability, "Query classified");
                ClassificationResult {
                    capability,
                    reasoning: Some(reply.trim().to_string()),
                    source: ClassificationSource::Model,
                }
            }
            None => {
                tracing::warn!(reply = %reply.trim(), "Unrecognized category");
                ClassificationResult::fallback(format!("unrecognized category: {}", reply.trim()))
            }
        }
    }
}

/// Parse a model reply into a capability label.
///
/// Substring matching in priority order, tolerant of replies that embed the
/// label in a sentence.
pub fn parse_label(reply: &str) -> Option<Capability> {
    let lower = reply.trim().to_lowercase();
    if lower.contains("visualization") || lower.contains("visualize") {
        Some(Capability::Visualization)
    } else if lower.contains("out") || lower.contains("scope") {
        Some(Capability::OutOfScope)
    } else if lower.contains("document") {
        Some(Capability::Document)
    } else if lower.contains("database") {
        Some(Capability::Database)
    } else if lower.contains("company") || lower.contains("knowledge") {
        Some(Capability::Knowledge)
    } else {
        None
    }
}

/// Build the constrained-output classification prompt.
fn build_prompt(query: &str) -> String {
    format!(
        r#"You are an intent classifier for a corporate lending company's chatbot system.

Classify the user's query into EXACTLY ONE category:

1. company knowledge
   Questions about company policies, lending procedures, loan products, fees,
   contact info, or how to use the company's services.
   Examples: "How do I apply for a loan?", "What are your interest rates?"

2. document q&a
   Questions specifically about an uploaded document's content.
   ONLY choose this if a document IS uploaded.
   Examples: "What is the interest rate in this document?", "Summarize this contract"

3. database
   Simple queries about specific loan records, customer data, or account
   balances. Database lookups WITHOUT visualization.
   Examples: "Show loan ID 12345", "How many active loans?"

4. visualization
   Queries requesting charts, graphs, or visual representations of data;
   trend analysis, comparisons, or distribution questions.
   Examples: "Show me a chart of loan amounts", "Plot monthly loan trends"

5. out_of_scope
   Greetings, chitchat, questions unrelated to lending or finance, or
   personal questions about the AI itself.
   Examples: "What's the weather today?", "Tell me a joke"

IMPORTANT RULES:
- Keywords like "chart", "graph", "plot", "visualize", "trend", "compare" mean visualization
- Simple data queries without visualization keywords mean database
- Greetings and pleasantries mean out_of_scope
- Company/policy questions mean company knowledge

User query: "{}"

Respond with EXACTLY one of: company knowledge, document q&a, database, visualization, out_of_scope"#,
        query
    )
}

// =============================================================================
// Tests
// =============================================================================
