//! Reading-plan JSON parser with validation.
//!
//! Parses a `reading_plan.json` string into a [`PlanDocument`] and validates:
//! - The document contains at least one plan.
//! - Every plan has at least one reading.
//! - Months are within 1-12 and days within 1-31.
//! - Reading strings are non-empty.
//!
//! Day/month combinations are not checked against the calendar; a plan may
//! carry a February 30th entry and the resolver will happily return it.

use std::collections::HashSet;

use thiserror::Error;

use super::json_format::PlanDocument;

/// Errors that can occur while loading the reading-plan document.
#[derive(Debug, Error)]
pub enum PlanLoadError {
    #[error("failed to read plan document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("plan document contains no plans")]
    NoPlans,

    #[error("plan {0:?} has no readings")]
    EmptyPlan(String),

    #[error("plan {plan:?} entry {index}: month {month} is outside 1-12")]
    InvalidMonth { plan: String, index: usize, month: u32 },

    #[error("plan {plan:?} entry {index}: day {day} is outside 1-31")]
    InvalidDay { plan: String, index: usize, day: u32 },

    #[error("plan {plan:?} entry {index}: reading is empty")]
    EmptyReading { plan: String, index: usize },
}

/// Parse and validate a `reading_plan.json` string.
pub fn parse_plan_document(content: &str) -> Result<PlanDocument, PlanLoadError> {
    let doc: PlanDocument = serde_json::from_str(content)?;
    validate(&doc)?;
    Ok(doc)
}

fn validate(doc: &PlanDocument) -> Result<(), PlanLoadError> {
    if doc.plans.is_empty() {
        return Err(PlanLoadError::NoPlans);
    }

    for (id, plan) in &doc.plans {
        if plan.readings.is_empty() {
            return Err(PlanLoadError::EmptyPlan(id.clone()));
        }

        for (index, entry) in plan.readings.iter().enumerate() {
            if !(1..=12).contains(&entry.month) {
                return Err(PlanLoadError::InvalidMonth {
                    plan: id.clone(),
                    index,
                    month: entry.month,
                });
            }
            if !(1..=31).contains(&entry.day) {
                return Err(PlanLoadError::InvalidDay {
                    plan: id.clone(),
                    index,
                    day: entry.day,
                });
            }
            if entry.reading.trim().is_empty() {
                return Err(PlanLoadError::EmptyReading {
                    plan: id.clone(),
                    index,
                });
            }
        }

        let mut seen = HashSet::new();
        let repeated = plan
            .readings
            .iter()
            .filter(|e| !seen.insert((e.month, e.day)))
            .count();
        if repeated > 0 {
            tracing::debug!(plan = %id, repeated, "calendar dates repeat; first entry wins");
        }

        let actual = plan.readings.len();
        if plan.total_days as usize != actual {
            tracing::warn!(
                plan = %id,
                declared = plan.total_days,
                actual,
                "total_days does not match the number of readings"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_reading(month: u32, day: u32, reading: &str) -> String {
        format!(
            r#"{{"plans": {{"12_month": {{"name": "12 Month Plan", "description": "", "total_days": 1,
                "readings": [{{"month": {month}, "day": {day}, "month_name": "January", "reading": "{reading}"}}]}}}}}}"#
        )
    }

    #[test]
    fn parse_valid_document() {
        let doc = parse_plan_document(&doc_with_reading(1, 1, "Genesis 1, Matthew 1"))
            .expect("should parse");
        assert_eq!(doc.plans.len(), 1);
    }

    #[test]
    fn rejects_empty_plans_object() {
        let err = parse_plan_document(r#"{"plans": {}}"#).unwrap_err();
        assert!(matches!(err, PlanLoadError::NoPlans), "got: {err}");
    }

    #[test]
    fn rejects_plan_without_readings() {
        let json = r#"{"plans": {"12_month": {"name": "x", "total_days": 0, "readings": []}}}"#;
        let err = parse_plan_document(json).unwrap_err();
        assert!(matches!(err, PlanLoadError::EmptyPlan(ref id) if id == "12_month"));
    }

    #[test]
    fn rejects_month_thirteen() {
        let err = parse_plan_document(&doc_with_reading(13, 1, "Genesis 1")).unwrap_err();
        assert!(matches!(err, PlanLoadError::InvalidMonth { month: 13, .. }));
    }

    #[test]
    fn rejects_day_zero() {
        let err = parse_plan_document(&doc_with_reading(1, 0, "Genesis 1")).unwrap_err();
        assert!(matches!(err, PlanLoadError::InvalidDay { day: 0, .. }));
    }

    #[test]
    fn accepts_day_thirty_one_in_february() {
        parse_plan_document(&doc_with_reading(2, 31, "Genesis 1")).expect("no calendar check");
    }

    #[test]
    fn rejects_blank_reading() {
        let err = parse_plan_document(&doc_with_reading(1, 1, "   ")).unwrap_err();
        assert!(matches!(err, PlanLoadError::EmptyReading { index: 0, .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_plan_document("{not json").unwrap_err();
        assert!(matches!(err, PlanLoadError::JsonError(_)));
    }
}
