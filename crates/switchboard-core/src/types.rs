use serde::{Deserialize, Serialize};

// =============================================================================
// Capability labels
// =============================================================================

/// The closed set of capability providers a request can be routed to.
///
/// The serde representation is the wire label that appears in the `backend`
/// field of every [`UnifiedResponse`] and as the key of a health report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Company-knowledge lookup (policies, products, procedures).
    #[serde(rename = "lf_assist")]
    Knowledge,
    /// Question answering over an uploaded document.
    #[serde(rename = "doc_assist")]
    Document,
    /// Database record lookup via generated queries.
    #[serde(rename = "db_assist")]
    Database,
    /// Data visualization: query generation plus chart suitability analysis.
    #[serde(rename = "viz_assist")]
    Visualization,
    /// No capability applies; handled by the static deflection path.
    #[serde(rename = "scope_guard")]
    OutOfScope,
}

impl Capability {
    /// All capability labels, in routing-table order.
    pub const ALL: [Capability; 5] = [
        Capability::Knowledge,
        Capability::Document,
        Capability::Database,
        Capability::Visualization,
        Capability::OutOfScope,
    ];

    /// The wire label for this capability.
    pub fn label(&self) -> &'static str {
        match self {
            Capability::Knowledge => "lf_assist",
            Capability::Document => "doc_assist",
            Capability::Database => "db_assist",
            Capability::Visualization => "viz_assist",
            Capability::OutOfScope => "scope_guard",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Requests
// =============================================================================

/// An uploaded file attached to a chat request.
#[derive(Clone)]
pub struct Attachment {
    /// Original filename as supplied by the caller.
    pub filename: String,
    /// Declared media type (must be `application/pdf`).
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Omit the raw bytes; a 5 MB hex dump helps nobody.
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// An incoming chat turn, as decoded from the HTTP surface.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Caller-supplied session identifier, if continuing a conversation.
    pub session_id: Option<String>,
    /// Optional attached document.
    pub file: Option<Attachment>,
}

// =============================================================================
// Classification
// =============================================================================

/// How a classification decision was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// File presence forced the document label without consulting the model.
    ForcedByFile,
    /// The language model produced the label.
    Model,
    /// The model failed or answered outside the label set; degraded to
    /// out-of-scope.
    Fallback,
}

/// Outcome of classifying one incoming message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The selected capability label.
    pub capability: Capability,
    /// Model-provided justification, when available.
    pub reasoning: Option<String>,
    /// How the decision was reached.
    pub source: ClassificationSource,
}

impl ClassificationResult {
    /// A result forced by the presence of an uploaded file.
    pub fn forced_by_file() -> Self {
        Self {
            capability: Capability::Document,
            reasoning: None,
            source: ClassificationSource::ForcedByFile,
        }
    }

    /// The degraded result used when classification fails.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            capability: Capability::OutOfScope,
            reasoning: Some(reason.into()),
            source: ClassificationSource::Fallback,
        }
    }
}

// =============================================================================
// Unified response
// =============================================================================

/// Configuration for rendering a single chart, as suggested by the
/// visualization provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart type: "bar", "line", "pie", "scatter", or "area".
    #[serde(rename = "type")]
    pub chart_type: String,
    /// Title to display on the chart.
    pub title: String,
    /// Data key for the X axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    /// Data key for the Y axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    /// Why this chart type was recommended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The visualization provider's verdict on whether a result set is
/// chartable, and how.
///
/// `auto_chart` is surfaced verbatim from the provider and is never
/// fabricated: its absence tells the caller to fall back to tabular display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartAnalysis {
    /// Whether the data is suitable for chart visualization.
    pub chartable: bool,
    /// Explanation of the chartability decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Recommended chart configuration, when chartable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_chart: Option<ChartConfig>,
    /// Alternative chart options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_charts: Option<Vec<serde_json::Value>>,
}

/// The single stable response shape returned for every chat turn,
/// regardless of which capability handled it.
///
/// `answer` is always populated, even on failure. Label-specific optional
/// fields are only ever populated for their own label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResponse {
    /// Which capability produced this response.
    pub backend: Capability,
    /// The user-facing answer text.
    pub answer: String,
    /// The session this turn belongs to, echoed back to the caller.
    pub session_id: String,
    /// Topic tags (knowledge label only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Tabular result rows (visualization label only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,
    /// The generated query text (visualization label only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    /// Chart suitability verdict and configuration (visualization only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_analysis: Option<ChartAnalysis>,
    /// Number of result rows (visualization label only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    /// Failure detail, populated alongside a fallback answer when the
    /// provider could not be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnifiedResponse {
    /// A minimal response carrying only the always-present fields.
    pub fn new(
        backend: Capability,
        answer: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            answer: answer.into(),
            session_id: session_id.into(),
            tags: None,
            data: None,
            sql_query: None,
            chart_analysis: None,
            record_count: None,
            error: None,
        }
    }
}

// =============================================================================
// Health
// =============================================================================

/// Liveness status of one capability provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Initializing,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Severity rank used to compute the worst-of aggregate. Higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Initializing => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Initializing => "initializing",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Per-capability health statuses plus a composed aggregate message.
///
/// Computed fresh on every poll; never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Status per capability label, keyed by wire label.
    pub status: std::collections::BTreeMap<Capability, HealthStatus>,
    /// Human-readable summary of the aggregate state.
    pub message: String,
}

impl HealthSnapshot {
    /// Build a snapshot from individual probe results, composing the
    /// aggregate message from the worst individual status.
    pub fn new(status: std::collections::BTreeMap<Capability, HealthStatus>) -> Self {
        let aggregate = status
            .values()
            .copied()
            .max_by_key(HealthStatus::severity)
            .unwrap_or(HealthStatus::Unhealthy);

        let message = match aggregate {
            HealthStatus::Healthy => "All backends healthy".to_string(),
            other => {
                let affected: Vec<String> = status
                    .iter()
                    .filter(|(_, s)| **s != HealthStatus::Healthy)
                    .map(|(c, s)| format!("{}: {}", c, s))
                    .collect();
                format!("Aggregate status {} ({})", other, affected.join(", "))
            }
        };

        Self { status, message }
    }

    /// The worst individual status.
    pub fn aggregate(&self) -> HealthStatus {
        self.status
            .values()
            .copied()
            .max_by_key(HealthStatus::severity)
            .unwrap_or(HealthStatus::Unhealthy)
    }
}

// =============================================================================
// Tests
// =============================================================================
