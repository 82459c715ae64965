use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use mcheyne_core::format::{Asked, Channel, format};
use mcheyne_core::passage::{DEFAULT_VERSION, bible_gateway_url};
use mcheyne_core::plan::{DEFAULT_PLAN, PlanStore, PlanSummary};
use mcheyne_core::resolve::{self, CalendarDate};
use mcheyne_core::source::{self, ReadingSource};
use mcheyne_core::voice::LooseValue;
use mcheyne_core::voice::alexa::{self, RequestEnvelope};
use mcheyne_core::voice::webhook::{
    self, DateIntent, MarkCompleteIntent, PassageIntent, ProgressIntent, TodayIntent,
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PlanStore>,
    /// Where the voice webhook and Alexa routes get readings from.
    pub source: Arc<dyn ReadingSource>,
}

impl AppState {
    pub fn new(store: Arc<PlanStore>, source: Arc<dyn ReadingSource>) -> Self {
        Self { store, source }
    }

    /// Voice channels answer from the same in-process store.
    pub fn local(store: Arc<PlanStore>) -> Self {
        let source = Arc::new(source::LocalSource::new(store.clone()));
        Self { store, source }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoiceTodayBody {
    #[serde(default)]
    plan_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoiceDateBody {
    #[serde(default)]
    month: Option<LooseValue>,
    #[serde(default)]
    day: Option<LooseValue>,
    #[serde(default)]
    plan_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionQuery {
    version: Option<String>,
}

/// Decode an optional JSON body. An empty body yields `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed request body");
        AppError::bad_request("Request body must be valid JSON")
    })
}

fn plan_or_default(plan: Option<String>) -> String {
    plan.filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PLAN.to_owned())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/plans", get(list_plans))
        .route("/api/reading/today/{plan_type}", get(today_reading))
        .route("/api/reading/all/{plan_type}", get(all_readings))
        .route("/api/reading/{plan_type}/{month}/{day}", get(date_reading))
        .route("/api/bible-gateway/{passage}", get(bible_gateway))
        .route("/api/passage/{passage}", get(passage))
        .route("/api/voice/today", post(voice_today))
        .route("/api/voice/date", post(voice_date))
        .route("/intent/today-reading", post(intent_today))
        .route("/intent/date-reading", post(intent_date))
        .route("/intent/read-passage", post(intent_read_passage))
        .route("/intent/mark-complete", post(intent_mark_complete))
        .route("/intent/progress", post(intent_progress))
        .route("/intent/health", get(intent_health))
        .route("/alexa", post(alexa_request))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let plans = state.store.plan_ids().join(", ");
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("reading plan API listening on http://{addr}");
    tracing::info!("available plans: {plans}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("reading plan API shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// REST handlers
// ---------------------------------------------------------------------------

async fn list_plans(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "success": true, "plans": state.store.summaries() }))
}

async fn today_reading(
    State(state): State<AppState>,
    Path(plan_type): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let (today, outcome) = resolve::resolve_today(&state.store, &plan_type);
    let formatted = format(outcome.as_ref().copied(), Asked::Today, Channel::Api);
    if !formatted.success {
        return Err(AppError::not_found(formatted.speech));
    }

    Ok(Json(json!({
        "success": true,
        "date": today,
        "reading": formatted.payload(),
    }))
    .into_response())
}

async fn all_readings(
    State(state): State<AppState>,
    Path(plan_type): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let plan = resolve::lookup_plan(&state.store, &plan_type)
        .map_err(|_| AppError::not_found("Plan not found"))?;

    Ok(Json(json!({
        "success": true,
        "plan": PlanSummary::from(plan),
        "readings": plan.readings,
    }))
    .into_response())
}

async fn date_reading(
    State(state): State<AppState>,
    Path((plan_type, month, day)): Path<(String, String, String)>,
) -> Result<axum::response::Response, AppError> {
    let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
        return Err(AppError::bad_request("Month and day must be numbers"));
    };
    let date = CalendarDate::new(month, day);

    let outcome = resolve::resolve_date(&state.store, &plan_type, date);
    let formatted = format(outcome.as_ref().copied(), Asked::OnDate(date), Channel::Api);
    if !formatted.success {
        return Err(AppError::not_found(formatted.speech));
    }

    Ok(Json(json!({
        "success": true,
        "date": date,
        "reading": formatted.payload(),
    }))
    .into_response())
}

fn version_or_default(query: VersionQuery) -> String {
    query
        .version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VERSION.to_owned())
}

async fn bible_gateway(
    Path(passage): Path<String>,
    Query(query): Query<VersionQuery>,
) -> impl IntoResponse {
    let version = version_or_default(query);
    let url = bible_gateway_url(&passage, &version);
    Json(json!({
        "success": true,
        "passage": passage,
        "version": version,
        "url": url,
    }))
}

async fn passage(
    Path(passage): Path<String>,
    Query(query): Query<VersionQuery>,
) -> impl IntoResponse {
    let version = version_or_default(query);
    let url = bible_gateway_url(&passage, &version);
    Json(json!({
        "success": true,
        "passage": passage,
        "version": version,
        "url": url,
        "note": "Use the URL to read the passage. Future versions may include full text.",
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// ---------------------------------------------------------------------------
// Voice API handlers
// ---------------------------------------------------------------------------

async fn voice_today(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let body: VoiceTodayBody = parse_body(&body)?;
    let plan = plan_or_default(body.plan_type);
    let reading = source::voice_today(&state.store, &plan, CalendarDate::today());
    Ok(Json(reading).into_response())
}

async fn voice_date(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let body: VoiceDateBody = parse_body(&body)?;
    let month = body.month.as_ref().and_then(LooseValue::as_month);
    let day = body.day.as_ref().and_then(LooseValue::as_positive);
    let (Some(month), Some(day)) = (month, day) else {
        return Ok(Json(json!({
            "success": false,
            "speech": "Please provide both month and day.",
            "text": "Invalid date",
        }))
        .into_response());
    };

    let plan = plan_or_default(body.plan_type);
    let reading = source::voice_on_date(&state.store, &plan, CalendarDate::new(month, day));
    Ok(Json(reading).into_response())
}

// ---------------------------------------------------------------------------
// Webhook + Alexa handlers
// ---------------------------------------------------------------------------

async fn intent_today(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let req: TodayIntent = parse_body(&body)?;
    Ok(Json(webhook::today_reading(state.source.as_ref(), &req).await).into_response())
}

async fn intent_date(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let req: DateIntent = parse_body(&body)?;
    Ok(Json(webhook::date_reading(state.source.as_ref(), &req).await).into_response())
}

async fn intent_read_passage(body: Bytes) -> Result<axum::response::Response, AppError> {
    let req: PassageIntent = parse_body(&body)?;
    Ok(Json(webhook::read_passage(&req)).into_response())
}

async fn intent_mark_complete(body: Bytes) -> Result<axum::response::Response, AppError> {
    let req: MarkCompleteIntent = parse_body(&body)?;
    Ok(Json(webhook::mark_complete(&req)).into_response())
}

async fn intent_progress(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let req: ProgressIntent = parse_body(&body)?;
    Ok(Json(webhook::progress(state.source.as_ref(), &req).await).into_response())
}

async fn intent_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "voice-assistant-webhook" }))
}

/// Alexa expects a speakable envelope even when the body does not decode.
async fn alexa_request(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<RequestEnvelope>(&body) {
        Ok(envelope) => Json(alexa::handle(state.source.as_ref(), envelope).await),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable alexa request");
            Json(alexa::error_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
