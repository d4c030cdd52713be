//! The uniform call contract shared by all capability adapters.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use switchboard_core::{Attachment, Capability, HealthStatus};
use switchboard_session::Turn;

use crate::error::BackendError;

/// One outbound provider invocation.
#[derive(Clone, Debug)]
pub struct ProviderCall {
    /// Which capability this call targets.
    pub capability: Capability,
    /// The user's query text.
    pub query: String,
    /// The uploaded document, for the document capability.
    pub attachment: Option<Attachment>,
    /// Per-attempt deadline.
    pub deadline: Duration,
}

impl ProviderCall {
    /// A call with no attachment.
    pub fn new(capability: Capability, query: impl Into<String>, deadline: Duration) -> Self {
        Self {
            capability,
            query: query.into(),
            attachment: None,
            deadline,
        }
    }
}

/// Conversational context injected into provider calls.
///
/// Providers keep their own per-thread history keyed by the session id; the
/// recent turns are available for adapters whose providers accept them
/// inline.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub session_id: String,
    pub recent_turns: Vec<Turn>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            recent_turns: Vec::new(),
        }
    }
}

/// Uniform wrapper around one capability provider.
///
/// Concrete adapters shape the outbound call for their provider and unwrap
/// its specific success payload; they hold no request-scoped mutable state
/// and are safely shared across concurrent requests. Retry is applied by
/// the caller, not inside the adapter.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// The capability this adapter serves.
    fn capability(&self) -> Capability;

    /// Perform one provider call and return the raw JSON payload.
    async fn invoke(
        &self,
        call: &ProviderCall,
        context: &SessionContext,
    ) -> Result<Value, BackendError>;

    /// Lightweight liveness probe of the underlying provider.
    async fn probe(&self) -> HealthStatus;
}

// =============================================================================
// Shared HTTP plumbing for the remote adapters
// =============================================================================

/// POST a JSON body and decode a JSON reply, classifying failures.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    url: &str,
    body: &Value,
    deadline: Duration,
) -> Result<Value, BackendError> {
    let deadline_ms = deadline.as_millis() as u64;
    let response = client
        .post(url)
        .timeout(deadline)
        .json(body)
        .send()
        .await
        .map_err(|e| BackendError::from_transport(e, deadline_ms))?;

    read_json(response, deadline_ms).await
}

/// Decode a response, mapping non-success statuses to [`BackendError::Status`].
pub(crate) async fn read_json(
    response: reqwest::Response,
    deadline_ms: u64,
) -> Result<Value, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    response
        .json()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(deadline_ms)
            } else {
                BackendError::Payload(e.to_string())
            }
        })
}

/// Probe a provider's health endpoint.
///
/// Success means healthy; an error status means the provider is up but
/// degraded; failure to connect at all means unhealthy.
pub(crate) async fn probe_url(client: &reqwest::Client, url: &str) -> HealthStatus {
    match client
        .get(url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => HealthStatus::Healthy,
        Ok(_) => HealthStatus::Degraded,
        Err(_) => HealthStatus::Unhealthy,
    }
}
