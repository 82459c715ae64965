//! Response shaping: turn a resolution outcome into per-channel text.
//!
//! Every channel gets the same three views of a successful lookup: the
//! entry itself (for JSON payloads), a speech sentence, and a display string
//! equal to the reading. Failures carry only a fixed apology.

use crate::plan::ReadingEntry;
use crate::resolve::{CalendarDate, ResolveError, month_name};

/// Surface through which a request arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// REST JSON API.
    Api,
    /// The `/api/voice/*` endpoints, also spoken by the webhook intents.
    Voice,
    /// Alexa skill.
    Alexa,
}

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asked {
    Today,
    OnDate(CalendarDate),
}

/// Channel-ready rendering of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResponse {
    pub success: bool,
    pub speech: String,
    pub text: String,
    pub reading: Option<ReadingEntry>,
}

impl FormattedResponse {
    /// The entry fields as JSON, or `Value::Null` on failure.
    pub fn payload(&self) -> serde_json::Value {
        self.reading
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Render a resolution outcome for `channel`.
pub fn format(
    outcome: Result<&ReadingEntry, &ResolveError>,
    asked: Asked,
    channel: Channel,
) -> FormattedResponse {
    match outcome {
        Ok(entry) => FormattedResponse {
            success: true,
            speech: success_speech(entry, asked, channel),
            text: entry.reading.clone(),
            reading: Some(entry.clone()),
        },
        Err(_) => failure(asked, channel),
    }
}

fn success_speech(entry: &ReadingEntry, asked: Asked, channel: Channel) -> String {
    match asked {
        Asked::Today => {
            let sentence = format!("Today's reading is {}", entry.reading);
            if channel == Channel::Alexa {
                format!("{sentence}. Would you like me to mark it as complete?")
            } else {
                sentence
            }
        }
        Asked::OnDate(date) => format!(
            "The reading for {} {} is {}",
            entry.month_name, date.day, entry.reading
        ),
    }
}

fn failure(asked: Asked, channel: Channel) -> FormattedResponse {
    let (speech, text) = match (channel, asked) {
        (Channel::Api, Asked::Today) => {
            ("No reading found for today".to_owned(), "No reading found for today")
        }
        (Channel::Api, Asked::OnDate(_)) => (
            "No reading found for this date".to_owned(),
            "No reading found for this date",
        ),
        (Channel::Alexa, Asked::Today) => (
            "I couldn't find today's reading. Please try again later.".to_owned(),
            "No reading available",
        ),
        (Channel::Alexa, Asked::OnDate(date)) => (
            format!("I couldn't find a reading for {}.", spoken_date(date)),
            "No reading available",
        ),
        (Channel::Voice, Asked::Today) => (
            "I could not find a reading for today.".to_owned(),
            "No reading available",
        ),
        (Channel::Voice, Asked::OnDate(date)) => (
            format!("I could not find a reading for {}.", spoken_date(date)),
            "No reading available",
        ),
    };
    FormattedResponse {
        success: false,
        speech,
        text: text.to_owned(),
        reading: None,
    }
}

/// "March 15", or "month 13 15" when the month number is out of range.
fn spoken_date(date: CalendarDate) -> String {
    match month_name(date.month) {
        Some(name) => format!("{name} {}", date.day),
        None => format!("month {} {}", date.month, date.day),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ReadingEntry {
        ReadingEntry {
            month: 3,
            day: 15,
            month_name: "March".into(),
            reading: "Exodus 24, Luke 1:39-80, Job 14, 1 Corinthians 1".into(),
        }
    }

    fn no_reading() -> ResolveError {
        ResolveError::NoReadingForDate {
            plan: "12_month".into(),
            month: 2,
            day: 30,
        }
    }

    #[test]
    fn today_voice_speech() {
        let e = entry();
        let resp = format(Ok(&e), Asked::Today, Channel::Voice);
        assert!(resp.success);
        assert_eq!(
            resp.speech,
            "Today's reading is Exodus 24, Luke 1:39-80, Job 14, 1 Corinthians 1"
        );
        assert_eq!(resp.text, e.reading);
    }

    #[test]
    fn today_alexa_asks_to_mark_complete() {
        let e = entry();
        let resp = format(Ok(&e), Asked::Today, Channel::Alexa);
        assert!(resp.speech.starts_with("Today's reading is Exodus 24"));
        assert!(resp.speech.ends_with(". Would you like me to mark it as complete?"));
    }

    #[test]
    fn specific_date_speech_uses_month_name() {
        let e = entry();
        let date = Asked::OnDate(CalendarDate::new(3, 15));
        for channel in [Channel::Api, Channel::Voice, Channel::Alexa] {
            let resp = format(Ok(&e), date, channel);
            assert_eq!(
                resp.speech,
                "The reading for March 15 is Exodus 24, Luke 1:39-80, Job 14, 1 Corinthians 1"
            );
        }
    }

    #[test]
    fn payload_embeds_entry_fields() {
        let e = entry();
        let resp = format(Ok(&e), Asked::Today, Channel::Api);
        let payload = resp.payload();
        assert_eq!(payload["month"], 3);
        assert_eq!(payload["day"], 15);
        assert_eq!(payload["month_name"], "March");
        assert_eq!(payload["reading"], e.reading);
    }

    #[test]
    fn failure_has_no_data() {
        let err = no_reading();
        let resp = format(Err(&err), Asked::OnDate(CalendarDate::new(2, 30)), Channel::Api);
        assert!(!resp.success);
        assert_eq!(resp.speech, "No reading found for this date");
        assert!(resp.reading.is_none());
        assert!(resp.payload().is_null());
    }

    #[test]
    fn voice_date_failure_names_the_date() {
        let err = no_reading();
        let resp = format(Err(&err), Asked::OnDate(CalendarDate::new(2, 30)), Channel::Voice);
        assert_eq!(resp.speech, "I could not find a reading for February 30.");
        assert_eq!(resp.text, "No reading available");
    }

    #[test]
    fn voice_date_failure_with_bad_month() {
        let err = ResolveError::UnknownPlan("x".into());
        let resp = format(Err(&err), Asked::OnDate(CalendarDate::new(13, 1)), Channel::Voice);
        assert_eq!(resp.speech, "I could not find a reading for month 13 1.");
    }

    #[test]
    fn unknown_plan_gets_same_apology_as_missing_date() {
        let a = format(
            Err(&ResolveError::UnknownPlan("x".into())),
            Asked::Today,
            Channel::Alexa,
        );
        let b = format(Err(&no_reading()), Asked::Today, Channel::Alexa);
        assert_eq!(a, b);
    }
}
