//! Integration tests for the Parla API.
//!
//! Exercises the chat and metrics endpoints over the full stack — router,
//! handlers, orchestrator, logger, aggregator — with an in-memory event
//! store and a scripted generator. Each test builds its own state.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use parla_api::create_router;
use parla_api::state::AppState;
use parla_assist::error::GenerateError;
use parla_assist::generator::Generated;
use parla_assist::{AssistRouter, TextGenerator};
use parla_core::config::ChatConfig;
use parla_core::Product;
use parla_flow::{default_catalog, Orchestrator};
use parla_metrics::MetricsService;
use parla_telemetry::{EventStore, InMemoryEventStore, InteractionLogger};

// =============================================================================
// Helpers
// =============================================================================

struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str, _: &str) -> Result<Generated, GenerateError> {
        Ok(Generated {
            text: format!("IA: {}", prompt),
            tokens_used: 11,
        })
    }
}

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _: &str, _: &str) -> Result<Generated, GenerateError> {
        Err(GenerateError::Transport("down".into()))
    }
}

fn products() -> Vec<Product> {
    vec![Product {
        id: "crm".into(),
        name: "CRM Pro".into(),
        description: "Gestão de relacionamento para PMEs.".into(),
    }]
}

/// Fresh state over an in-memory store and the given generator.
fn make_state(generator: Arc<dyn TextGenerator>) -> (AppState, Arc<InMemoryEventStore>) {
    let store = Arc::new(InMemoryEventStore::new());
    let (logger, _diag_rx) = InteractionLogger::new(store.clone());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(default_catalog(&products())),
        AssistRouter::new(generator),
        logger,
        products(),
        ChatConfig::default(),
        true,
    ));
    let metrics = MetricsService::new(store.clone() as Arc<dyn EventStore>);
    (AppState::new(orchestrator, metrics), store)
}

fn make_app() -> (axum::Router, Arc<InMemoryEventStore>) {
    let (state, store) = make_state(Arc::new(EchoGenerator));
    (create_router(state, 4080), store)
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a session and return its id.
async fn start_session(app: &axum::Router) -> Uuid {
    let resp = app
        .clone()
        .oneshot(post_json(
            "/chat/sessions",
            r#"{"user_id":"u-1","user_name":"Maria","user_role":"partner"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["session_id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _) = make_app();
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 0);
}

// =============================================================================
// Chat endpoints
// =============================================================================

#[tokio::test]
async fn test_create_session_returns_greeting() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(post_json(
            "/chat/sessions",
            r#"{"user_id":"u-1","user_name":"Maria","user_role":"partner"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert!(body["session_id"].is_string());
    assert_eq!(body["turn"]["role"], "bot");
    assert!(!body["turn"]["options"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_message_keyword_navigation() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", sid),
            r#"{"text":"tenho uma dúvida"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let turn = body_json(resp).await;
    assert_eq!(turn["role"], "bot");
    assert!(turn["content"].as_str().unwrap().contains("dúvida"));
}

#[tokio::test]
async fn test_post_message_unknown_session_is_404() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", Uuid::new_v4()),
            r#"{"text":"oi"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_post_message_empty_is_400() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", sid),
            r#"{"text":""}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_option_redirect() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/option", sid),
            r#"{"option_id":"duvidas"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let turn = body_json(resp).await;
    assert!(turn["content"].as_str().unwrap().contains("assunto"));
}

#[tokio::test]
async fn test_post_option_unknown_is_400() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/option", sid),
            r#"{"option_id":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_mode_round_trip() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .clone()
        .oneshot(post_json(
            &format!("/chat/sessions/{}/ai-mode", sid),
            r#"{"enabled":true}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", sid),
            r#"{"text":"fale do CRM Pro"}"#,
        ))
        .await
        .unwrap();
    let turn = body_json(resp).await;
    assert_eq!(turn["content"], "IA: fale do CRM Pro");
    assert_eq!(turn["generated"], true);
}

#[tokio::test]
async fn test_ai_failure_degrades_to_apology() {
    let (state, _) = make_state(Arc::new(FailingGenerator));
    let app = create_router(state, 4080);
    let sid = start_session(&app).await;

    app.clone()
        .oneshot(post_json(
            &format!("/chat/sessions/{}/ai-mode", sid),
            r#"{"enabled":true}"#,
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", sid),
            r#"{"text":"qualquer coisa"}"#,
        ))
        .await
        .unwrap();
    // Still a 200: generation failures never surface as errors.
    assert_eq!(resp.status(), StatusCode::OK);

    let turn = body_json(resp).await;
    let labels: Vec<&str> = turn["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Tentar novamente", "Voltar ao menu"]);
}

#[tokio::test]
async fn test_feedback_recorded() {
    let (app, store) = make_app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/chat/sessions",
            r#"{"user_id":"u-1","user_name":"Maria","user_role":"partner"}"#,
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let sid: Uuid = body["session_id"].as_str().unwrap().parse().unwrap();
    let turn_id = body["turn"]["id"].as_str().unwrap();

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/feedback", sid),
            &format!(r#"{{"turn_id":"{}","helpful":true}}"#, turn_id),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The vote lands in the event store as its own appended event.
    for _ in 0..50 {
        let events = store.fetch_all().await.unwrap();
        if events.iter().any(|e| e.was_helpful == Some(true)) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("vote event never appended");
}

#[tokio::test]
async fn test_delete_session() {
    let (app, _) = make_app();
    let sid = start_session(&app).await;

    let resp = app
        .clone()
        .oneshot(
            Request::delete(format!("/chat/sessions/{}", sid))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_json(
            &format!("/chat/sessions/{}/message", sid),
            r#"{"text":"oi"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Metrics endpoints
// =============================================================================

#[tokio::test]
async fn test_metrics_summary_empty_store() {
    let (app, _) = make_app();
    let resp = app.oneshot(get("/metrics/summary")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["total_interactions"], 0);
    assert_eq!(body["helpfulness_rate"], 0.0);
}

#[tokio::test]
async fn test_metrics_summary_counts_conversation() {
    let (app, store) = make_app();
    let sid = start_session(&app).await;

    app.clone()
        .oneshot(post_json(
            &format!("/chat/sessions/{}/option", sid),
            r#"{"option_id":"duvidas"}"#,
        ))
        .await
        .unwrap();

    // Appends are fire-and-forget; wait for them to land.
    for _ in 0..50 {
        if store.len().await >= 3 {
            break;
        }
        tokio::task::yield_now().await;
    }

    let resp = app.oneshot(get("/metrics/summary")).await.unwrap();
    let body = body_json(resp).await;
    assert!(body["total_interactions"].as_u64().unwrap() >= 3);
    assert_eq!(body["total_sessions"], 1);
    let options = body["most_clicked_options"].as_array().unwrap();
    assert_eq!(options[0]["option"], "Tirar uma dúvida");
}

#[tokio::test]
async fn test_metrics_summary_invalid_range_is_400() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(get("/metrics/summary?from=not-a-date"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_export_is_csv() {
    let (app, _) = make_app();
    let resp = app.oneshot(get("/metrics/export")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = body_text(resp).await;
    assert!(csv.starts_with("id,userId,userName"));
}
