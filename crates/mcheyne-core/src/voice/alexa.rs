//! Alexa skill request handling.
//!
//! Accepts the Alexa request envelope (launch, intent, session-ended) and
//! builds the matching response envelope. The user's chosen plan rides in
//! the session attributes under `planType`; the voice platform owns that
//! session, we only read it and echo it back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::input::LooseValue;
use crate::client_state::Progress;
use crate::format::{Asked, Channel, format};
use crate::plan::DEFAULT_PLAN;
use crate::source::ReadingSource;

const PLAN_ATTRIBUTE: &str = "planType";
const COMPLETED_ATTRIBUTE: &str = "completedCount";

const WELCOME: &str = "Welcome to the M'Cheyne Bible Reading Plan! \
You can ask me for today's reading, a reading for a specific date, \
or to mark your reading as complete. What would you like to know?";

const HELP: &str = "I can help you with the M'Cheyne Bible Reading Plan. \
You can ask me for today's reading, a reading for a specific date, \
mark your reading as complete, or check your progress. \
What would you like to do?";

const GENERIC_ERROR: &str = "Sorry, I had trouble doing what you asked. Please try again.";

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub session: Option<Session>,
    pub request: AlexaRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AlexaRequest {
    LaunchRequest {},
    IntentRequest {
        intent: Intent,
    },
    SessionEndedRequest {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<String>,
}

impl Intent {
    fn slot(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|s| s.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: &'static str,
    pub session_attributes: Map<String, Value>,
    pub response: AlexaResponse,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlexaResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

fn plain(text: impl Into<String>) -> OutputSpeech {
    OutputSpeech {
        kind: "PlainText",
        text: text.into(),
    }
}

/// Response under construction, mirroring the speak/reprompt builder of the
/// skill SDKs.
struct ResponseBuilder {
    attributes: Map<String, Value>,
    response: AlexaResponse,
}

impl ResponseBuilder {
    fn new(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            response: AlexaResponse::default(),
        }
    }

    fn speak(mut self, text: impl Into<String>) -> Self {
        self.response.output_speech = Some(plain(text));
        self.response.should_end_session = Some(true);
        self
    }

    fn reprompt(mut self, text: impl Into<String>) -> Self {
        self.response.reprompt = Some(Reprompt {
            output_speech: plain(text),
        });
        self.response.should_end_session = Some(false);
        self
    }

    fn build(self) -> ResponseEnvelope {
        ResponseEnvelope {
            version: "1.0",
            session_attributes: self.attributes,
            response: self.response,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Map a spoken plan name onto a plan identifier.
pub fn plan_from_spoken(spoken: &str) -> &'static str {
    match spoken.trim().to_lowercase().as_str() {
        "one year" => "12_month",
        "two year" => "24_month",
        "four year" => "48_month",
        _ => DEFAULT_PLAN,
    }
}

/// Handle one Alexa request envelope.
pub async fn handle(source: &dyn ReadingSource, envelope: RequestEnvelope) -> ResponseEnvelope {
    let attributes = envelope.session.map(|s| s.attributes).unwrap_or_default();
    let rb = ResponseBuilder::new(attributes);

    match envelope.request {
        AlexaRequest::LaunchRequest {} => rb.speak(WELCOME).reprompt(WELCOME).build(),
        AlexaRequest::IntentRequest { intent } => handle_intent(source, rb, &intent).await,
        AlexaRequest::SessionEndedRequest { reason } => {
            tracing::info!(reason = ?reason, "alexa session ended");
            rb.build()
        }
        AlexaRequest::Unsupported => rb.speak(GENERIC_ERROR).reprompt(GENERIC_ERROR).build(),
    }
}

/// Reply for a request body that is not an Alexa envelope at all. There is
/// no session to echo, so the attributes are empty.
pub fn error_response() -> ResponseEnvelope {
    ResponseBuilder::new(Map::new())
        .speak(GENERIC_ERROR)
        .reprompt(GENERIC_ERROR)
        .build()
}

async fn handle_intent(
    source: &dyn ReadingSource,
    rb: ResponseBuilder,
    intent: &Intent,
) -> ResponseEnvelope {
    let plan = rb
        .attributes
        .get(PLAN_ATTRIBUTE)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PLAN)
        .to_owned();

    match intent.name.as_str() {
        "GetTodayReadingIntent" => match source.today(&plan).await {
            Ok(reading) if reading.success => {
                let speech = match reading.reading.as_ref() {
                    Some(entry) => format(Ok(entry), Asked::Today, Channel::Alexa).speech,
                    None => format!("{}. Would you like me to mark it as complete?", reading.speech),
                };
                rb.speak(speech)
                    .reprompt("Would you like to mark today's reading as complete?")
                    .build()
            }
            Ok(_) => rb
                .speak("I couldn't find today's reading. Please try again later.")
                .build(),
            Err(e) => {
                tracing::warn!(plan = %plan, error = %e, "alexa today intent failed");
                rb.speak("Sorry, I'm having trouble accessing the reading plan right now.")
                    .build()
            }
        },

        "GetDateReadingIntent" => {
            let (Some(month_spoken), Some(day_spoken)) = (intent.slot("month"), intent.slot("day"))
            else {
                return rb
                    .speak("I need both a month and day. For example, say 'What's the reading for March 15th?'")
                    .reprompt("Please tell me the month and day you'd like to know about.")
                    .build();
            };

            let not_found = format!("I couldn't find a reading for {month_spoken} {day_spoken}.");
            let month = LooseValue::Text(month_spoken.to_owned()).as_month();
            let day = LooseValue::Text(day_spoken.to_owned()).as_positive();
            let (Some(month), Some(day)) = (month, day) else {
                return rb.speak(not_found).build();
            };

            match source.on_date(month, day, &plan).await {
                Ok(reading) if reading.success => rb.speak(reading.speech).build(),
                Ok(_) => rb.speak(not_found).build(),
                Err(e) => {
                    tracing::warn!(plan = %plan, month, day, error = %e, "alexa date intent failed");
                    rb.speak("Sorry, I had trouble finding that reading.").build()
                }
            }
        }

        "MarkCompleteIntent" => {
            let mut rb = rb;
            let count = completed_count(&rb.attributes) + 1;
            rb.attributes
                .insert(COMPLETED_ATTRIBUTE.to_owned(), Value::from(count));
            rb.speak("Great job! I've marked today's reading as complete. Keep up the good work!")
                .build()
        }

        "GetProgressIntent" => match source.total_days(&plan).await {
            Ok(Some(total)) => {
                let progress = Progress::new(completed_count(&rb.attributes).min(total), total);
                let speech = format!(
                    "You've completed {} out of {} readings. That's about {} percent. Keep up the great work!",
                    progress.completed,
                    progress.total,
                    progress.percentage.round()
                );
                rb.speak(speech).build()
            }
            Ok(None) => rb.speak("I couldn't retrieve your progress right now.").build(),
            Err(e) => {
                tracing::warn!(plan = %plan, error = %e, "alexa progress intent failed");
                rb.speak("I couldn't retrieve your progress right now.").build()
            }
        },

        "ChangePlanIntent" => match intent.slot("planType") {
            Some(spoken) => {
                let mut rb = rb;
                rb.attributes.insert(
                    PLAN_ATTRIBUTE.to_owned(),
                    Value::from(plan_from_spoken(spoken)),
                );
                rb.speak(format!(
                    "Okay, I've switched you to the {spoken} plan. What would you like to know?"
                ))
                .reprompt("What would you like to know?")
                .build()
            }
            None => rb
                .speak("I didn't catch which plan you want. You can choose from one year, two year, or four year plans.")
                .reprompt("Which plan would you like?")
                .build(),
        },

        "AMAZON.HelpIntent" => rb.speak(HELP).reprompt(HELP).build(),

        "AMAZON.CancelIntent" | "AMAZON.StopIntent" => rb.speak("Happy reading! Goodbye!").build(),

        other => {
            tracing::info!(intent = other, "unhandled alexa intent");
            rb.speak(GENERIC_ERROR).reprompt(GENERIC_ERROR).build()
        }
    }
}

fn completed_count(attributes: &Map<String, Value>) -> u32 {
    attributes
        .get(COMPLETED_ATTRIBUTE)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
