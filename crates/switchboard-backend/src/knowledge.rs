//! Adapter for the company-knowledge provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use switchboard_core::{Capability, HealthStatus};

use crate::adapter::{post_json, probe_url, BackendAdapter, ProviderCall, SessionContext};
use crate::error::BackendError;

/// Calls the retrieval-augmented company-knowledge service.
///
/// Wire contract: `POST {base}/chat` with `{query, session_id}`, answering
/// `{query, tags, answer}`.
pub struct KnowledgeAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl KnowledgeAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BackendAdapter for KnowledgeAdapter {
    fn capability(&self) -> Capability {
        Capability::Knowledge
    }

    async fn invoke(
        &self,
        call: &ProviderCall,
        context: &SessionContext,
    ) -> Result<Value, BackendError> {
        let body = json!({
            "query": call.query,
            "session_id": context.session_id,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability() {
        let adapter = KnowledgeAdapter::new("http://localhost:8001");
        assert_eq!(adapter.capability(), Capability::Knowledge);
    }

    #[test]
    fn test_base_url_normalized() {
        let adapter = KnowledgeAdapter::new("http://localhost:8001/");
        assert_eq!(adapter.base_url, "http://localhost:8001");
    }
}
