//! Provider call errors, split into retryable and non-retryable classes.

/// Errors from a provider invocation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The per-call deadline elapsed.
    #[error("provider call timed out after {0} ms")]
    Timeout(u64),

    /// The provider could not be reached.
    #[error("network error: {0}")]
    Connect(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The provider's reply could not be decoded into the expected shape.
    #[error("invalid provider payload: {0}")]
    Payload(String),

    /// The outbound call could not be shaped from the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only transient transport failures and server-side errors consume
    /// retry budget; a request the provider has rejected as malformed will
    /// be rejected again.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Timeout(_) | BackendError::Connect(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::Payload(_) | BackendError::InvalidRequest(_) => false,
        }
    }

    /// Classify a reqwest transport error.
    pub fn from_transport(err: reqwest::Error, deadline_ms: u64) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(deadline_ms)
        } else {
            BackendError::Connect(err.to_string())
        }
    }
}
