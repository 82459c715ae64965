//! Integration tests for `HttpSource` against an in-process API.
//!
//! Spins up a minimal axum server on an ephemeral port that serves the
//! `/api/plans` and `/api/voice/*` shapes, then drives the webhook intents
//! through `HttpSource`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use mcheyne_core::plan::PlanStore;
use mcheyne_core::resolve::CalendarDate;
use mcheyne_core::source::{HttpSource, ReadingSource, voice_on_date, voice_today};
use mcheyne_core::voice::LooseValue;
use mcheyne_core::voice::webhook::{self, DateIntent, ProgressIntent, TodayIntent};
use mcheyne_test_utils::{NEW_YEARS_READING, sample_store};

async fn plans(State(store): State<Arc<PlanStore>>) -> Json<Value> {
    Json(json!({"success": true, "plans": store.summaries()}))
}

async fn today(State(store): State<Arc<PlanStore>>, Json(body): Json<Value>) -> Json<Value> {
    let plan = body["planType"].as_str().unwrap_or("12_month");
    Json(serde_json::to_value(voice_today(&store, plan, CalendarDate::today())).unwrap())
}

async fn on_date(State(store): State<Arc<PlanStore>>, Json(body): Json<Value>) -> Json<Value> {
    let plan = body["planType"].as_str().unwrap_or("12_month");
    let date = CalendarDate::new(
        body["month"].as_u64().unwrap() as u32,
        body["day"].as_u64().unwrap() as u32,
    );
    Json(serde_json::to_value(voice_on_date(&store, plan, date)).unwrap())
}

async fn broken() -> &'static str {
    "this is not json"
}

/// Start the stub API and return its base URL.
async fn spawn_api(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn api_router() -> Router {
    Router::new()
        .route("/api/plans", get(plans))
        .route("/api/voice/today", post(today))
        .route("/api/voice/date", post(on_date))
        .with_state(sample_store())
}

#[tokio::test]
async fn date_intent_through_http_source() {
    let base = spawn_api(api_router()).await;
    let source = HttpSource::new(base, Duration::from_secs(5)).unwrap();

    let req = DateIntent {
        month: Some(LooseValue::Number(1)),
        day: Some(LooseValue::Number(1)),
        plan_type: None,
    };
    let resp = webhook::date_reading(&source, &req).await;
    assert!(resp.success);
    assert_eq!(
        resp.speech,
        format!("The reading for January 1 is {NEW_YEARS_READING}")
    );
    assert_eq!(resp.data.unwrap()["reading"], NEW_YEARS_READING);
}

#[tokio::test]
async fn today_intent_through_http_source() {
    let base = spawn_api(api_router()).await;
    let source = HttpSource::new(base, Duration::from_secs(5)).unwrap();

    let resp = webhook::today_reading(&source, &TodayIntent::default()).await;
    assert!(resp.success);
    assert!(resp.speech.starts_with("Today's reading is "));
    assert!(!resp.should_end_session);
}

#[tokio::test]
async fn total_days_through_http_source() {
    let base = spawn_api(api_router()).await;
    let source = HttpSource::new(base, Duration::from_secs(5)).unwrap();

    assert_eq!(source.total_days("24_month").await.unwrap(), Some(6));
    assert_eq!(source.total_days("nope").await.unwrap(), None);

    let req = ProgressIntent {
        completed: Some(3),
        plan_type: Some("24_month".into()),
        ..Default::default()
    };
    let resp = webhook::progress(&source, &req).await;
    assert_eq!(resp.data.unwrap()["percentage"], 50.0);
}

#[tokio::test]
async fn unreadable_upstream_body_is_reported_as_error_speech() {
    let router = Router::new().route("/api/voice/today", post(broken));
    let base = spawn_api(router).await;
    let source = HttpSource::new(base, Duration::from_secs(5)).unwrap();

    let resp = webhook::today_reading(&source, &TodayIntent::default()).await;
    assert!(!resp.success);
    assert_eq!(
        resp.speech,
        "I'm having trouble accessing the reading plan right now."
    );
    assert_eq!(resp.display_text, "Error");
    assert!(resp.should_end_session);
}
