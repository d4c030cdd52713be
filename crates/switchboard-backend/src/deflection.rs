//! The out-of-scope deflection path.
//!
//! Returns a static polite non-answer without any external call, so an
//! out-of-scope turn can never fail and never consumes retry budget.

use async_trait::async_trait;
use serde_json::{json, Value};

use switchboard_core::{Capability, HealthStatus};

use crate::adapter::{BackendAdapter, ProviderCall, SessionContext};
use crate::error::BackendError;

/// The polite non-answer for queries no capability covers.
pub const DEFLECTION_ANSWER: &str = "I'd love to help you with that! My specialty is \
assisting with loan applications, policies, document reviews, account information, \
and data visualizations. What can I help you with regarding our lending services today?";

/// Adapter for the out-of-scope label. Holds no client and makes no calls.
pub struct DeflectionAdapter;

#[async_trait]
impl BackendAdapter for DeflectionAdapter {
    fn capability(&self) -> Capability {
        Capability::OutOfScope
    }

    async fn invoke(
        &self,
        _call: &ProviderCall,
        _context: &SessionContext,
    ) -> Result<Value, BackendError> {
        Ok(json!({ "answer": DEFLECTION_ANSWER }))
    }

    async fn probe(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
