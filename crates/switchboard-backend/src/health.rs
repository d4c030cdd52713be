//! Aggregated health reporting across all capability adapters.

use std::collections::BTreeMap;
use std::sync::Arc;

use switchboard_core::HealthSnapshot;

use crate::adapter::BackendAdapter;

/// Polls every adapter's liveness and aggregates the results.
///
/// Each probe is independent: one provider's failure is reported as that
/// provider's status and never as a process-wide failure. Snapshots are
/// computed fresh on every call.
pub struct HealthMonitor {
    adapters: Vec<Arc<dyn BackendAdapter>>,
}

impl HealthMonitor {
    pub fn new(adapters: Vec<Arc<dyn BackendAdapter>>) -> Self {
        Self { adapters }
    }

    /// Probe every adapter and compose a snapshot.
    pub async fn check(&self) -> HealthSnapshot {
        let mut status = BTreeMap::new();
        for adapter in &self.adapters {
            let health = adapter.probe().await;
            tracing::debug!(capability = %adapter.capability(), status = %health, "Probe");
            status.insert(adapter.capability(), health);
        }
        HealthSnapshot::new(status)
    }
}
