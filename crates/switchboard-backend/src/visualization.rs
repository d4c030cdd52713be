//! Adapter for the data-visualization provider.

use async_trait::async_trait;
use serde_json::{json, Value};

use switchboard_core::{Capability, HealthStatus};

use crate::adapter::{post_json, BackendAdapter, ProviderCall, SessionContext};
use crate::error::BackendError;

/// Calls the query-generation and chart-analysis service.
///
/// Wire contract: `POST {base}/chat` with `{question, thread_id}`, answering
/// `{sql_query, data, chart_analysis, error, record_count}`. The provider's
/// health endpoint reports an `initialized` flag while its agent warms up.
pub struct VisualizationAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl VisualizationAdapter {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BackendAdapter for VisualizationAdapter {
    fn capability(&self) -> Capability {
        Capability::Visualization
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
        let url = format!("{}/health", self.base_url);
        let response = match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(r) => r,
            Err(_) => return HealthStatus::Unhealthy,
        };
        if !response.status().is_success() {
            return HealthStatus::Degraded;
        }
        // A reachable provider that has not finished building its agent
        // reports initialized=false.
        match response.json::<Value>().await {
            Ok(body) if body.get("initialized").and_then(Value::as_bool) == Some(false) => {
                HealthStatus::Initializing
            }
            _ => HealthStatus::Healthy,
        }
    }
}
