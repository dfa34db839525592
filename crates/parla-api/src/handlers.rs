//! Route handlers for the Parla API.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parla_core::{ChatTurn, DateRange, Identity};
use parla_metrics::MetricsSummary;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.session_count(),
    })
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub user_name: String,
    pub user_role: String,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub turn: ChatTurn,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let identity = Identity {
        user_id: req.user_id,
        user_name: req.user_name,
        user_role: req.user_role,
    };
    let (session_id, turn) = state.orchestrator.start_session(identity)?;
    Ok(Json(CreateSessionResponse { session_id, turn }))
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let turn = state.orchestrator.handle_text(session_id, &req.text).await?;
    Ok(Json(turn))
}

#[derive(Deserialize)]
pub struct OptionRequest {
    pub option_id: String,
}

pub async fn post_option(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<OptionRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let turn = state
        .orchestrator
        .handle_option(session_id, &req.option_id)
        .await?;
    Ok(Json(turn))
}

#[derive(Deserialize)]
pub struct AiModeRequest {
    pub enabled: bool,
}

pub async fn set_ai_mode(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AiModeRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let turn = state.orchestrator.set_ai_mode(session_id, req.enabled)?;
    Ok(Json(turn))
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub turn_id: Uuid,
    pub helpful: bool,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub recorded: bool,
}

pub async fn post_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    state
        .orchestrator
        .record_feedback(session_id, req.turn_id, req.helpful)?;
    Ok(Json(FeedbackResponse { recorded: true }))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.orchestrator.end_session(session_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Deserialize)]
pub struct RangeParams {
    /// Inclusive lower bound, RFC 3339.
    pub from: Option<String>,
    /// Inclusive upper bound, RFC 3339.
    pub to: Option<String>,
}

fn parse_range(params: &RangeParams) -> Result<Option<DateRange>, ApiError> {
    fn parse(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ApiError::BadRequest(format!("invalid `{}` timestamp: {}", field, e)))
    }

    let from = params
        .from
        .as_deref()
        .map(|v| parse("from", v))
        .transpose()?;
    let to = params.to.as_deref().map(|v| parse("to", v)).transpose()?;

    if from.is_none() && to.is_none() {
        Ok(None)
    } else {
        Ok(Some(DateRange::new(from, to)))
    }
}

pub async fn metrics_summary(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<MetricsSummary>, ApiError> {
    let range = parse_range(&params)?;
    Ok(Json(state.metrics.summary(range).await))
}

pub async fn metrics_export(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let range = parse_range(&params)?;
    let csv = state.metrics.export(range).await;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat_metrics.csv\"",
            ),
        ],
        csv,
    ))
}
