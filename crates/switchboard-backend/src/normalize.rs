//! Pure transformation from provider-specific payloads to the unified
//! response shape.
//!
//! One function per capability label; nothing here performs I/O. A payload
//! that cannot be decoded is a non-retryable [`BackendError::Payload`].

use serde_json::Value;

use switchboard_core::{Capability, ChartAnalysis, UnifiedResponse};

use crate::error::BackendError;

/// The user-facing answer when a provider stayed unreachable through the
/// whole retry budget.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I wasn't able to process that request \
just now. Please try again in a moment.";

/// Normalize a provider payload for the given label.
pub fn normalize(
    capability: Capability,
    payload: &Value,
    session_id: &str,
) -> Result<UnifiedResponse, BackendError> {
    match capability {
        Capability::Knowledge => normalize_knowledge(payload, session_id),
        Capability::Document => normalize_answer_only(Capability::Document, payload, session_id),
        Capability::Database => normalize_database(payload, session_id),
        Capability::Visualization => normalize_visualization(payload, session_id),
        Capability::OutOfScope => {
            normalize_answer_only(Capability::OutOfScope, payload, session_id)
        }
    }
}

/// The degraded response returned when the retry budget is exhausted:
/// same label, fallback answer, failure detail in `error`.
pub fn failure(capability: Capability, session_id: &str, detail: &str) -> UnifiedResponse {
    let mut response = UnifiedResponse::new(capability, FALLBACK_ANSWER, session_id);
    response.error = Some(detail.to_string());
    response
}

fn require_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, BackendError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Payload(format!("missing field '{}'", field)))
}

fn normalize_knowledge(payload: &Value, session_id: &str) -> Result<UnifiedResponse, BackendError> {
    let answer = require_str(payload, "answer")?;
    let mut response = UnifiedResponse::new(Capability::Knowledge, answer, session_id);

    let tags: Vec<String> = payload
        .get("tags")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if !tags.is_empty() {
        response.tags = Some(tags);
    }
    Ok(response)
}

fn normalize_answer_only(
    capability: Capability,
    payload: &Value,
    session_id: &str,
) -> Result<UnifiedResponse, BackendError> {
    let answer = require_str(payload, "answer")?;
    Ok(UnifiedResponse::new(capability, answer, session_id))
}

fn normalize_database(payload: &Value, session_id: &str) -> Result<UnifiedResponse, BackendError> {
    let answer = require_str(payload, "response")?;
    Ok(UnifiedResponse::new(Capability::Database, answer, session_id))
}

fn normalize_visualization(
    payload: &Value,
    session_id: &str,
) -> Result<UnifiedResponse, BackendError> {
    // A provider-reported failure still yields a well-formed response for
    // the visualization label.
    if let Some(detail) = payload.get("error").and_then(Value::as_str) {
        if !detail.is_empty() {
            let mut response = UnifiedResponse::new(
                Capability::Visualization,
                format!("Visualization Error: {}", detail),
                session_id,
            );
            response.error = Some(detail.to_string());
            response.chart_analysis = parse_chart_analysis(payload);
            return Ok(response);
        }
    }

    let rows: Vec<Value> = payload
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let record_count = rows.len();

    let chart_analysis = parse_chart_analysis(payload);
    let mut answer = format!(
        "Query executed successfully. Retrieved {} records.",
        record_count
    );
    if let Some(chart) = chart_analysis
        .as_ref()
        .filter(|a| a.chartable)
        .and_then(|a| a.auto_chart.as_ref())
    {
        answer.push_str(&format!(" Chart type: {}", chart.chart_type));
    }

    let mut response = UnifiedResponse::new(Capability::Visualization, answer, session_id);
    response.data = Some(rows);
    response.record_count = Some(record_count);
    response.sql_query = payload
        .get("sql_query")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    response.chart_analysis = chart_analysis;
    Ok(response)
}

/// Decode the provider's chart verdict, if any.
///
/// A chart configuration is surfaced only when the provider reports the
/// result chartable; its absence is meaningful (the caller falls back to
/// tabular display) and is never fabricated.
fn parse_chart_analysis(payload: &Value) -> Option<ChartAnalysis> {
    let raw = payload.get("chart_analysis")?;
    let mut analysis: ChartAnalysis = serde_json::from_value(raw.clone()).ok()?;
    if !analysis.chartable {
        analysis.auto_chart = None;
    }
    Some(analysis)
}

// =============================================================================
// Tests
// =============================================================================
