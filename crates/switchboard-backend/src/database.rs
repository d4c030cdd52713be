//! Adapter for the database-query provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use switchboard_core::{Capability, HealthStatus};

use crate::adapter::{post_json, probe_url, BackendAdapter, ProviderCall, SessionContext};
use crate::error::BackendError;

/// Calls the natural-language-to-SQL lookup service.
///
/// Wire contract: `POST {base}/chat` with `{question, thread_id}`, answering
/// `{response, success}`.
pub struct DatabaseAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl DatabaseAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BackendAdapter for DatabaseAdapter {
    fn capability(&self) -> Capability {
        Capability::Database
    }

    async fn invoke(
        &self,
        call: &ProviderCall,
        context: &SessionContext,
    ) -> Result<Value, BackendError> {
        let body = json!({
            "question": call.query,
            "thread_id": context.session_id,
        });
        post_json(
            &self.client,
            &format!("{}/chat", self.base_url),
            &body,
            call.deadline,
        )
        .await
    }

    async fn probe(&self) -> HealthStatus {
        probe_url(&self.client, &format!("{}/health", self.base_url)).await
    }
}
