//! Error types for intent classification.
//!
//! These never escape the classifier: every failure degrades to the
//! out-of-scope label instead of failing the request.

/// Errors from the language-understanding call.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classification deadline of {0} ms exceeded")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
    #[error("model error: {0}")]
    Provider(String),
    #[error("malformed model reply: {0}")]
    Parse(String),
}
