//! Generic voice-assistant webhook intents.
//!
//! Each intent takes its JSON body and returns a [`WebhookResponse`]
//! (`{success, speech, displayText, shouldEndSession, data?}`) for a
//! home-made assistant to speak and display.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::input::LooseValue;
use crate::client_state::Progress;
use crate::passage::{DEFAULT_VERSION, bible_gateway_url};
use crate::plan::DEFAULT_PLAN;
use crate::source::{ReadingSource, VoiceReading};

const UPSTREAM_ERROR_SPEECH: &str = "I'm having trouble accessing the reading plan right now.";

/// Envelope returned by every webhook intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub speech: String,
    pub display_text: String,
    pub should_end_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl WebhookResponse {
    fn failure(speech: &str, display_text: &str, should_end_session: bool) -> Self {
        Self {
            success: false,
            speech: speech.to_owned(),
            display_text: display_text.to_owned(),
            should_end_session,
            data: None,
        }
    }

    fn upstream_error() -> Self {
        Self::failure(UPSTREAM_ERROR_SPEECH, "Error", true)
    }

    fn from_reading(reading: VoiceReading) -> Self {
        Self {
            success: reading.success,
            speech: reading.speech,
            display_text: reading.text,
            should_end_session: false,
            data: reading
                .reading
                .and_then(|r| serde_json::to_value(r).ok()),
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayIntent {
    #[serde(default)]
    pub plan_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateIntent {
    #[serde(default)]
    pub month: Option<LooseValue>,
    #[serde(default)]
    pub day: Option<LooseValue>,
    #[serde(default)]
    pub plan_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageIntent {
    #[serde(default)]
    pub passage: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkCompleteIntent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Progress lives with the client, so the client reports its own count.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressIntent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub completed: Option<u32>,
}

fn plan_or_default(plan: Option<&str>) -> &str {
    plan.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PLAN)
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// `today-reading`: today's reading for the requested plan.
pub async fn today_reading(source: &dyn ReadingSource, req: &TodayIntent) -> WebhookResponse {
    let plan = plan_or_default(req.plan_type.as_deref());
    match source.today(plan).await {
        Ok(reading) => WebhookResponse::from_reading(reading),
        Err(e) => {
            tracing::warn!(plan, error = %e, "today-reading intent failed");
            WebhookResponse::upstream_error()
        }
    }
}

/// `date-reading`: the reading for a spoken month and day.
pub async fn date_reading(source: &dyn ReadingSource, req: &DateIntent) -> WebhookResponse {
    let month = req.month.as_ref().and_then(LooseValue::as_month);
    let day = req.day.as_ref().and_then(LooseValue::as_positive);
    let (Some(month), Some(day)) = (month, day) else {
        return WebhookResponse::failure(
            "I need a month and day. For example, say 'What's the reading for March 15th?'",
            "Please provide a date",
            false,
        );
    };

    let plan = plan_or_default(req.plan_type.as_deref());
    match source.on_date(month, day, plan).await {
        Ok(reading) => WebhookResponse::from_reading(reading),
        Err(e) => {
            tracing::warn!(plan, month, day, error = %e, "date-reading intent failed");
            WebhookResponse::upstream_error()
        }
    }
}

/// `read-passage`: hand back a Bible Gateway link for the passage.
pub fn read_passage(req: &PassageIntent) -> WebhookResponse {
    let Some(passage) = req.passage.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
        return WebhookResponse::failure(
            "I need a passage reference. For example, say 'Read John 3:16'",
            "Please provide a passage",
            false,
        );
    };
    let version = req
        .version
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_VERSION);

    WebhookResponse {
        success: true,
        speech: format!("Opening {passage} in the {version} translation."),
        display_text: passage.to_owned(),
        should_end_session: true,
        data: Some(json!({
            "passage": passage,
            "version": version,
            "url": bible_gateway_url(passage, version),
        })),
    }
}

/// `mark-complete`: acknowledge only; completion is stored client side.
pub fn mark_complete(req: &MarkCompleteIntent) -> WebhookResponse {
    tracing::debug!(user = ?req.user_id, date = ?req.date, "mark-complete intent");
    WebhookResponse {
        success: true,
        speech: "Great job! I've marked today's reading as complete.".to_owned(),
        display_text: "Reading marked complete".to_owned(),
        should_end_session: true,
        data: None,
    }
}

/// `progress`: report the client's completed count against the plan length.
pub async fn progress(source: &dyn ReadingSource, req: &ProgressIntent) -> WebhookResponse {
    let plan = plan_or_default(req.plan_type.as_deref());
    let total = match source.total_days(plan).await {
        Ok(Some(total)) => total,
        Ok(None) => {
            return WebhookResponse::failure(
                "I couldn't retrieve your progress right now.",
                "Error",
                true,
            );
        }
        Err(e) => {
            tracing::warn!(plan, error = %e, "progress intent failed");
            return WebhookResponse::upstream_error();
        }
    };

    let progress = Progress::new(req.completed.unwrap_or(0).min(total), total);
    WebhookResponse {
        success: true,
        speech: format!(
            "You've completed {} out of {} readings. Keep up the great work!",
            progress.completed, progress.total
        ),
        display_text: format!("{} / {} readings complete", progress.completed, progress.total),
        should_end_session: true,
        data: serde_json::to_value(progress).ok(),
    }
}
