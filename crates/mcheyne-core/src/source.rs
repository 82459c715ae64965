//! Reading sources for the voice channels.
//!
//! Voice front ends (the generic webhook and the Alexa skill) obtain their
//! readings through a [`ReadingSource`]. [`LocalSource`] answers from the
//! in-process store; [`HttpSource`] forwards to a remote core API's
//! `/api/voice/*` endpoints, the way a separately deployed voice front end
//! would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{Asked, Channel, format};
use crate::plan::{PlanStore, PlanSummary, ReadingEntry};
use crate::resolve::{CalendarDate, resolve_date};

/// Body shape of `/api/voice/today` and `/api/voice/date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceReading {
    pub success: bool,
    pub speech: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<ReadingEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<CalendarDate>,
}

/// Errors from a reading source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("reading plan API unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Where voice channels get their readings from.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Today's reading for `plan_id`.
    async fn today(&self, plan_id: &str) -> Result<VoiceReading, SourceError>;

    /// The reading for an explicit month/day in `plan_id`.
    async fn on_date(&self, month: u32, day: u32, plan_id: &str)
    -> Result<VoiceReading, SourceError>;

    /// Summaries of every available plan.
    async fn plans(&self) -> Result<Vec<PlanSummary>, SourceError>;

    /// Declared day count of `plan_id`, or `None` if the plan is unknown.
    async fn total_days(&self, plan_id: &str) -> Result<Option<u32>, SourceError> {
        Ok(self
            .plans()
            .await?
            .into_iter()
            .find(|p| p.id == plan_id)
            .map(|p| p.total_days))
    }
}

const _: () = {
    fn _assert_object_safe(_: &dyn ReadingSource) {}
};

/// Voice-shaped reading for today, resolved against `store`.
pub fn voice_today(store: &PlanStore, plan_id: &str, today: CalendarDate) -> VoiceReading {
    let outcome = resolve_date(store, plan_id, today);
    let formatted = format(outcome.as_ref().copied(), Asked::Today, Channel::Voice);
    VoiceReading {
        success: formatted.success,
        speech: formatted.speech,
        text: formatted.text,
        date: formatted.success.then_some(today),
        reading: formatted.reading,
    }
}

/// Voice-shaped reading for an explicit date, resolved against `store`.
pub fn voice_on_date(store: &PlanStore, plan_id: &str, date: CalendarDate) -> VoiceReading {
    let outcome = resolve_date(store, plan_id, date);
    let formatted = format(outcome.as_ref().copied(), Asked::OnDate(date), Channel::Voice);
    VoiceReading {
        success: formatted.success,
        speech: formatted.speech,
        text: formatted.text,
        date: formatted.success.then_some(date),
        reading: formatted.reading,
    }
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Answers from an in-process [`PlanStore`].
#[derive(Debug, Clone)]
pub struct LocalSource {
    store: Arc<PlanStore>,
}

impl LocalSource {
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadingSource for LocalSource {
    async fn today(&self, plan_id: &str) -> Result<VoiceReading, SourceError> {
        Ok(voice_today(&self.store, plan_id, CalendarDate::today()))
    }

    async fn on_date(
        &self,
        month: u32,
        day: u32,
        plan_id: &str,
    ) -> Result<VoiceReading, SourceError> {
        Ok(voice_on_date(&self.store, plan_id, CalendarDate::new(month, day)))
    }

    async fn plans(&self) -> Result<Vec<PlanSummary>, SourceError> {
        Ok(self.store.summaries())
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Forwards to a remote core API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PlansBody {
    plans: Vec<PlanSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayBody<'a> {
    plan_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateBody<'a> {
    month: u32,
    day: u32,
    plan_type: &'a str,
}

impl HttpSource {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a source pointed at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::UpstreamUnavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<VoiceReading, SourceError> {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.post(&url).json(body);
        Self::send(&url, request).await
    }

    async fn send<T: serde::de::DeserializeOwned>(
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SourceError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "voice upstream request failed");
            SourceError::UpstreamUnavailable(e.to_string())
        })?;

        response.json::<T>().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "voice upstream returned an unreadable body");
            SourceError::UpstreamUnavailable(e.to_string())
        })
    }
}

#[async_trait]
impl ReadingSource for HttpSource {
    async fn today(&self, plan_id: &str) -> Result<VoiceReading, SourceError> {
        self.post("/api/voice/today", &TodayBody { plan_type: plan_id })
            .await
    }

    async fn on_date(
        &self,
        month: u32,
        day: u32,
        plan_id: &str,
    ) -> Result<VoiceReading, SourceError> {
        self.post(
            "/api/voice/date",
            &DateBody {
                month,
                day,
                plan_type: plan_id,
            },
        )
        .await
    }

    async fn plans(&self) -> Result<Vec<PlanSummary>, SourceError> {
        let url = format!("{}/api/plans", self.base_url);
        let request = self.client.get(&url);
        let body: PlansBody = Self::send(&url, request).await?;
        Ok(body.plans)
    }
}
