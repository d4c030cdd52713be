//! The router/dispatcher: one entry point per chat turn.
//!
//! Resolves the session, validates input, classifies, selects the adapter
//! for the label, invokes it under the retry policy, normalizes the reply,
//! and appends the turn to the session. Downstream outages degrade to a
//! same-label response with a fallback answer; they never surface as hard
//! failures.

use std::sync::Arc;
use std::time::Duration;

use switchboard_backend::normalize::{self, normalize as normalize_payload};
use switchboard_backend::{BackendAdapter, ProviderCall, RetryPolicy, SessionContext};
use switchboard_classify::Classifier;
use switchboard_core::config::LimitsConfig;
use switchboard_core::{Capability, ChatRequest, UnifiedResponse};
use switchboard_session::{Role, SessionError, SessionStore, Turn};

use crate::validate::{validate_attachment, validate_message, ValidationError};

/// Recent turns forwarded to adapters as conversational context.
const CONTEXT_TURNS: usize = 10;

/// One adapter per capability label.
///
/// Selection is an exhaustive match, so adding a label is a compile-time
/// checked change.
pub struct AdapterSet {
    pub knowledge: Arc<dyn BackendAdapter>,
    pub document: Arc<dyn BackendAdapter>,
    pub database: Arc<dyn BackendAdapter>,
    pub visualization: Arc<dyn BackendAdapter>,
    pub deflection: Arc<dyn BackendAdapter>,
}

impl AdapterSet {
    /// The adapter serving the given label.
    pub fn select(&self, capability: Capability) -> &Arc<dyn BackendAdapter> {
        match capability {
            Capability::Knowledge => &self.knowledge,
            Capability::Document => &self.document,
            Capability::Database => &self.database,
            Capability::Visualization => &self.visualization,
            Capability::OutOfScope => &self.deflection,
        }
    }

    /// All adapters, for health monitoring.
    pub fn all(&self) -> Vec<Arc<dyn BackendAdapter>> {
        vec![
            Arc::clone(&self.knowledge),
            Arc::clone(&self.document),
            Arc::clone(&self.database),
            Arc::clone(&self.visualization),
            Arc::clone(&self.deflection),
        ]
    }
}

/// Errors the router surfaces to the HTTP layer.
///
/// Validation failures become client errors; session store corruption is
/// the only path to a hard server error. Provider failures never appear
/// here; they degrade inside [`Router::handle`].
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session store failure: {0}")]
    Session(String),
}

impl From<SessionError> for RouterError {
    fn from(err: SessionError) -> Self {
        RouterError::Session(err.to_string())
    }
}

/// Central dispatcher wiring classifier, adapters, and session store.
pub struct Router {
    classifier: Classifier,
    adapters: AdapterSet,
    sessions: Arc<SessionStore>,
    retry: RetryPolicy,
    call_timeout: Duration,
    limits: LimitsConfig,
}

impl Router {
    pub fn new(
        classifier: Classifier,
        adapters: AdapterSet,
        sessions: Arc<SessionStore>,
        retry: RetryPolicy,
        call_timeout: Duration,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            classifier,
            adapters,
            sessions,
            retry,
            call_timeout,
            limits,
        }
    }

    /// Handle one chat turn end to end.
    pub async fn handle(&self, request: ChatRequest) -> Result<UnifiedResponse, RouterError> {
        self.validate(&request)?;

        let session_id = self.sessions.get_or_create(request.session_id.as_deref())?;
        let classification = self
            .classifier
            .classify(&request.message, request.file.is_some())
            .await;
        tracing::info!(
            session_id = %session_id,
            capability = %classification.capability,
            source = ?classification.source,
            "Query routed"
        );

        self.dispatch(classification.capability, request, session_id)
            .await
    }

    /// Handle a chat turn for one fixed capability, bypassing classification.
    ///
    /// Backs the per-capability sub-routes used for direct integration and
    /// debugging.
    pub async fn handle_direct(
        &self,
        capability: Capability,
        request: ChatRequest,
    ) -> Result<UnifiedResponse, RouterError> {
        self.validate(&request)?;
        if capability == Capability::Document && request.file.is_none() {
            return Err(ValidationError::MissingFile.into());
        }

        let session_id = self.sessions.get_or_create(request.session_id.as_deref())?;
        tracing::info!(session_id = %session_id, capability = %capability, "Direct call");
        self.dispatch(capability, request, session_id).await
    }

    /// The session store backing this router.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The adapters behind this router, for health monitoring.
    pub fn adapters(&self) -> &AdapterSet {
        &self.adapters
    }

    // -- Private helpers --

    fn validate(&self, request: &ChatRequest) -> Result<(), ValidationError> {
        validate_message(&request.message, &self.limits)?;
        if let Some(attachment) = &request.file {
            validate_attachment(attachment, &self.limits)?;
        }
        Ok(())
    }

    /// Invoke, normalize, and record one provider call.
    async fn dispatch(
        &self,
        capability: Capability,
        request: ChatRequest,
        session_id: String,
    ) -> Result<UnifiedResponse, RouterError> {
        let adapter = self.adapters.select(capability);

        let mut call = ProviderCall::new(capability, request.message.clone(), self.call_timeout);
        if capability == Capability::Document {
            call.attachment = request.file.clone();
        }

        let context = SessionContext {
            session_id: session_id.clone(),
            recent_turns: self
                .sessions
                .get(&session_id)?
                .map(|s| {
                    let skip = s.turns.len().saturating_sub(CONTEXT_TURNS);
                    s.turns[skip..].to_vec()
                })
                .unwrap_or_default(),
        };

        let response = match self
            .retry
            .run(capability.label(), || adapter.invoke(&call, &context))
            .await
        {
            Ok(payload) => match normalize_payload(capability, &payload, &session_id) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(capability = %capability, error = %e, "Unusable provider payload");
                    normalize::failure(capability, &session_id, &e.to_string())
                }
            },
            Err(e) => {
                tracing::error!(capability = %capability, error = %e, "Provider unavailable");
                normalize::failure(capability, &session_id, &e.to_string())
            }
        };

        // The turn is committed only once a renderable response exists, so
        // a cancelled request leaves no partial session mutation behind.
        self.sessions.append_turns(
            &session_id,
            vec![
                Turn::now(Role::User, request.message.clone()),
                Turn::now(Role::Assistant, response.answer.clone()),
            ],
            capability,
        )?;

        Ok(response)
    }
}

// =============================================================================
// Tests
// =============================================================================
