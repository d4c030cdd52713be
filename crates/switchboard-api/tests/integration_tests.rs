//! Integration tests for the Switchboard API.
//!
//! Exercises the full HTTP surface against scripted adapters and a scripted
//! classification model. Each test is independent with its own in-memory
//! state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use switchboard_api::{create_router, AppState};
use switchboard_backend::{
    BackendAdapter, BackendError, DeflectionAdapter, ProviderCall, RetryPolicy, SessionContext,
};
use switchboard_classify::{Classifier, ClassifyError, IntentModel};
use switchboard_core::config::LimitsConfig;
use switchboard_core::{Capability, HealthStatus};
use switchboard_router::{AdapterSet, Router};
use switchboard_session::SessionStore;

// =============================================================================
// Test doubles
// =============================================================================

/// Model that always answers with a fixed label.
struct FixedModel(&'static str);

#[async_trait]
impl IntentModel for FixedModel {
    async fn complete(&self, _prompt: &str) -> Result<String, ClassifyError> {
        Ok(self.0.to_string())
    }
}

/// Adapter returning a fixed payload after a fixed number of failures.
struct StubAdapter {
    capability: Capability,
    payload: Value,
    failures: u32,
    health: HealthStatus,
    calls: AtomicU32,
}

impl StubAdapter {
    fn healthy(capability: Capability, payload: Value) -> Arc<Self> {
        Arc::new(Self {
            capability,
            payload,
            failures: 0,
            health: HealthStatus::Healthy,
            calls: AtomicU32::new(0),
        })
    }

    fn failing(capability: Capability, health: HealthStatus) -> Arc<Self> {
        Arc::new(Self {
            capability,
            payload: Value::Null,
            failures: u32::MAX,
            health,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl BackendAdapter for StubAdapter {
    fn capability(&self) -> Capability {
        self.capability
    }

    async fn invoke(
        &self,
        _call: &ProviderCall,
        _context: &SessionContext,
    ) -> Result<Value, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(BackendError::Timeout(30_000))
        } else {
            Ok(self.payload.clone())
        }
    }

    async fn probe(&self) -> HealthStatus {
        self.health
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn default_adapters() -> AdapterSet {
    AdapterSet {
        knowledge: StubAdapter::healthy(
            Capability::Knowledge,
            json!({ "answer": "knowledge answer", "tags": ["policy"] }),
        ),
        document: StubAdapter::healthy(
            Capability::Document,
            json!({ "answer": "document answer" }),
        ),
        database: StubAdapter::healthy(
            Capability::Database,
            json!({ "response": "database answer" }),
        ),
        visualization: StubAdapter::healthy(
            Capability::Visualization,
            json!({
                "sql_query": "SELECT state, COUNT(*) AS n FROM loans GROUP BY state",
                "data": [{ "state": "CA", "n": 3 }],
                "chart_analysis": { "chartable": false, "reasoning": "few rows" }
            }),
        ),
        deflection: Arc::new(DeflectionAdapter),
    }
}

fn make_state_with(model_reply: &'static str, adapters: AdapterSet) -> AppState {
    let router = Router::new(
        Classifier::new(Arc::new(FixedModel(model_reply)), Duration::from_secs(5)),
        adapters,
        Arc::new(SessionStore::new(30, 100)),
        RetryPolicy::immediate(3),
        Duration::from_secs(1),
        LimitsConfig::default(),
    );
    AppState::new(router)
}

fn make_app(model_reply: &'static str) -> axum::Router {
    create_router(make_state_with(model_reply, default_adapters()))
}

/// Synthesize a minimal valid PDF with the given number of empty pages.
fn make_pdf(pages: usize) -> Vec<u8> {
    use lopdf::{dictionary, Document, Object};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture PDF");
    bytes
}

const BOUNDARY: &str = "switchboard-test-boundary";

/// Build a multipart/form-data body for the chat endpoints.
struct FormBuilder {
    body: Vec<u8>,
}

impl FormBuilder {
    fn new() -> Self {
        Self { body: Vec::new() }
    }

    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

fn multipart_post(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn chat_request(message: &str) -> Request<Body> {
    multipart_post("/chat", FormBuilder::new().text("message", message).build())
}

/// Read full response body as JSON.
async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Root and health
// =============================================================================

#[tokio::test]
async fn test_root_descriptor() {
    let app = make_app("database");
    let resp = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["service"], "Switchboard Router");
    let backends: Vec<&str> = json["backends"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        backends,
        vec!["lf_assist", "doc_assist", "db_assist", "viz_assist", "scope_guard"]
    );
}

#[tokio::test]
async fn test_health_all_healthy() {
    let app = make_app("database");
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    let status = json["status"].as_object().unwrap();
    assert_eq!(status.len(), 5);
    for label in ["lf_assist", "doc_assist", "db_assist", "viz_assist", "scope_guard"] {
        assert_eq!(status[label], "healthy");
    }
    assert_eq!(json["message"], "All backends healthy");
}

#[tokio::test]
async fn test_health_single_failure_isolated() {
    let mut adapters = default_adapters();
    adapters.visualization =
        StubAdapter::failing(Capability::Visualization, HealthStatus::Unhealthy);
    let app = create_router(make_state_with("database", adapters));

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["status"]["viz_assist"], "unhealthy");
    assert_eq!(json["status"]["db_assist"], "healthy");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("viz_assist: unhealthy"));
}

// =============================================================================
// Unified chat
// =============================================================================

#[tokio::test]
async fn test_chat_routes_by_classification() {
    let app = make_app("database");
    let resp = app.oneshot(chat_request("show loan 12345")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["backend"], "db_assist");
    assert_eq!(json["answer"], "database answer");
    assert!(json["session_id"].as_str().unwrap().len() > 0);
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_chat_knowledge_includes_tags() {
    let app = make_app("company knowledge");
    let resp = app.oneshot(chat_request("how do I apply")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "lf_assist");
    assert_eq!(json["tags"], json!(["policy"]));
}

#[tokio::test]
async fn test_chat_out_of_scope_deflects() {
    let app = make_app("out_of_scope");
    let resp = app.oneshot(chat_request("tell me a joke")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "scope_guard");
    assert!(json["answer"].as_str().unwrap().contains("lending"));
}

#[tokio::test]
async fn test_chat_missing_message_is_400() {
    let app = make_app("database");
    let resp = app
        .oneshot(multipart_post(
            "/chat",
            FormBuilder::new().text("session_id", "s1").build(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("message"));
}

#[tokio::test]
async fn test_chat_truncated_multipart_is_422() {
    // A part that ends mid-stream, with no closing boundary.
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\nhel",
        BOUNDARY
    )
    .into_bytes();
    let app = make_app("database");
    let resp = app.oneshot(multipart_post("/chat", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "unprocessable_entity");
}

#[tokio::test]
async fn test_chat_empty_message_is_400() {
    let app = make_app("database");
    let resp = app.oneshot(chat_request("")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_chat_oversize_message_is_400() {
    let app = make_app("database");
    let resp = app.oneshot(chat_request(&"a".repeat(2001))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_message_at_limit_accepted() {
    let app = make_app("database");
    let resp = app.oneshot(chat_request(&"a".repeat(2000))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// File handling
// =============================================================================

fn pdf_chat_request(message: &str, pdf: Vec<u8>, content_type: &str) -> Request<Body> {
    multipart_post(
        "/chat",
        FormBuilder::new()
            .text("message", message)
            .file("file", "contract.pdf", content_type, &pdf)
            .build(),
    )
}

#[tokio::test]
async fn test_chat_with_file_forces_document_backend() {
    // The model would say "database"; the attached file must win.
    let app = make_app("database");
    let resp = app
        .oneshot(pdf_chat_request(
            "summarize this",
            make_pdf(2),
            "application/pdf",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "doc_assist");
    assert_eq!(json["answer"], "document answer");
}

#[tokio::test]
async fn test_chat_non_pdf_file_is_400() {
    let app = make_app("database");
    let resp = app
        .oneshot(pdf_chat_request("summarize", make_pdf(2), "image/png"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("image/png"));
}

#[tokio::test]
async fn test_chat_file_at_page_limit_accepted() {
    let app = make_app("database");
    let resp = app
        .oneshot(pdf_chat_request("summarize", make_pdf(20), "application/pdf"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_file_over_page_limit_is_400() {
    let app = make_app("database");
    let resp = app
        .oneshot(pdf_chat_request("summarize", make_pdf(21), "application/pdf"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("21"));
}

#[tokio::test]
async fn test_chat_corrupted_pdf_is_400() {
    let app = make_app("database");
    let resp = app
        .oneshot(pdf_chat_request(
            "summarize",
            b"not a pdf".to_vec(),
            "application/pdf",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_chat_session_continuity() {
    let state = make_state_with("database", default_adapters());
    let app = create_router(state.clone());

    let resp = app
        .clone()
        .oneshot(chat_request("show loan 1"))
        .await
        .unwrap();
    let first = body_json(resp).await;
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(multipart_post(
            "/chat",
            FormBuilder::new()
                .text("message", "show loan 2")
                .text("session_id", &session_id)
                .build(),
        ))
        .await
        .unwrap();
    let second = body_json(resp).await;
    assert_eq!(second["session_id"], session_id.as_str());

    // Two turns per call: user + assistant.
    let turns = state.sessions.history(&session_id).unwrap();
    assert_eq!(turns.len(), 4);
}

#[tokio::test]
async fn test_clear_unknown_session_reports_success() {
    let app = make_app("database");
    let resp = app
        .oneshot(
            Request::post("/chat/clear/never-existed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_clear_existing_session() {
    let state = make_state_with("database", default_adapters());
    let app = create_router(state.clone());

    let resp = app
        .clone()
        .oneshot(chat_request("show loan 1"))
        .await
        .unwrap();
    let session_id = body_json(resp).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::post(format!("/chat/clear/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.sessions.get(&session_id).unwrap().is_none());
}

// =============================================================================
// Degraded provider behavior
// =============================================================================

#[tokio::test]
async fn test_viz_outage_returns_renderable_response() {
    let mut adapters = default_adapters();
    adapters.visualization =
        StubAdapter::failing(Capability::Visualization, HealthStatus::Unhealthy);
    let app = create_router(make_state_with("visualization", adapters));

    let resp = app
        .oneshot(chat_request("plot loans by state"))
        .await
        .unwrap();
    // Downstream outage is not an HTTP failure.
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["backend"], "viz_assist");
    assert!(json["answer"].as_str().unwrap().contains("sorry"));
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    assert!(json.get("data").is_none());
    assert!(json.get("sql_query").is_none());
}

#[tokio::test]
async fn test_viz_unchartable_data_has_no_auto_chart() {
    let app = make_app("visualization");
    let resp = app
        .oneshot(chat_request("plot loans by state"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "viz_assist");
    assert_eq!(json["record_count"], 1);
    assert!(json.get("data").is_some());
    assert_eq!(json["chart_analysis"]["chartable"], false);
    assert!(json["chart_analysis"].get("auto_chart").is_none());
}

// =============================================================================
// Per-capability sub-routes
// =============================================================================

#[tokio::test]
async fn test_direct_database_chat() {
    // Classifier would deflect; the direct route must bypass it.
    let app = make_app("out_of_scope");
    let resp = app
        .oneshot(multipart_post(
            "/db-assist/chat",
            FormBuilder::new().text("message", "show loan 1").build(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "db_assist");
}

#[tokio::test]
async fn test_direct_document_chat_requires_file() {
    let app = make_app("database");
    let resp = app
        .oneshot(multipart_post(
            "/doc-assist/chat",
            FormBuilder::new().text("message", "summarize").build(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("PDF"));
}

#[tokio::test]
async fn test_direct_document_chat_with_file() {
    let app = make_app("database");
    let resp = app
        .oneshot(multipart_post(
            "/doc-assist/chat",
            FormBuilder::new()
                .text("message", "summarize")
                .file("file", "contract.pdf", "application/pdf", &make_pdf(3))
                .build(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["backend"], "doc_assist");
}

#[tokio::test]
async fn test_direct_sessions_scoped_to_capability() {
    let state = make_state_with("database", default_adapters());
    let app = create_router(state.clone());

    // One database session via the direct route.
    let resp = app
        .clone()
        .oneshot(multipart_post(
            "/db-assist/chat",
            FormBuilder::new().text("message", "show loan 1").build(),
        ))
        .await
        .unwrap();
    let db_session = body_json(resp).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    // And one knowledge session.
    app.clone()
        .oneshot(multipart_post(
            "/lf-assist/chat",
            FormBuilder::new().text("message", "how do I apply").build(),
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(
            Request::get("/db-assist/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(resp).await;
    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], db_session.as_str());
    assert_eq!(sessions[0]["last_backend"], "db_assist");
}

#[tokio::test]
async fn test_direct_history_fetch() {
    let app = make_app("database");
    let resp = app
        .clone()
        .oneshot(multipart_post(
            "/db-assist/chat",
            FormBuilder::new().text("message", "show loan 1").build(),
        ))
        .await
        .unwrap();
    let session_id = body_json(resp).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = app
        .oneshot(
            Request::get(format!("/db-assist/history/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["session_id"], session_id.as_str());
    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "show loan 1");
    assert_eq!(turns[1]["role"], "assistant");
}

#[tokio::test]
async fn test_direct_history_unknown_session_is_404() {
    let app = make_app("database");
    let resp = app
        .oneshot(
            Request::get("/db-assist/history/never-existed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_direct_clear_route() {
    let app = make_app("database");
    let resp = app
        .oneshot(
            Request::post("/viz-assist/clear/some-session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
}
