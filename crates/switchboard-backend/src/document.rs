//! Adapter for the document question-answering provider.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use switchboard_core::{Capability, HealthStatus};

use crate::adapter::{probe_url, read_json, BackendAdapter, ProviderCall, SessionContext};
use crate::error::BackendError;

/// Calls the PDF question-answering service.
///
/// Wire contract: `POST {base}/ask` as multipart form with a `question`
/// field and a `file` part, answering `{answer}`.
pub struct DocumentAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl DocumentAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BackendAdapter for DocumentAdapter {
    fn capability(&self) -> Capability {
        Capability::Document
    }

    async fn invoke(
        &self,
        call: &ProviderCall,
        _context: &SessionContext,
    ) -> Result<Value, BackendError> {
        // The router validates attachments before dispatch; reaching this
        // point without one is a caller bug, not a provider outage.
        let attachment = call.attachment.as_ref().ok_or_else(|| {
            BackendError::InvalidRequest("document call without an attachment".to_string())
        })?;

        let file_part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.filename.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        let form = Form::new()
            .text("question", call.query.clone())
            .part("file", file_part);

        let deadline_ms = call.deadline.as_millis() as u64;
        let response = self
            .client
            .post(format!("{}/ask", self.base_url))
            .timeout(call.deadline)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, deadline_ms))?;

        read_json(response, deadline_ms).await
    }

    async fn probe(&self) -> HealthStatus {
        probe_url(&self.client, &format!("{}/health", self.base_url)).await
    }
}
