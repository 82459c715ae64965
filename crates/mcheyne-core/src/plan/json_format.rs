//! JSON format types for the reading-plan document.
//!
//! These types map directly to the `reading_plan.json` on-disk format and
//! are deserialized via `serde` + `serde_json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level structure of a `reading_plan.json` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanDocument {
    /// Document title (e.g. "M'Cheyne Bible Reading Plan").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plans keyed by identifier (`12_month`, `24_month`, ...).
    pub plans: BTreeMap<String, PlanJson>,
}

/// A single plan entry under `plans`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanJson {
    /// Display name, e.g. "12 Month Plan".
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared number of days. Reported verbatim by the plans listing.
    pub total_days: u32,
    /// Daily readings in chronological order.
    pub readings: Vec<ReadingEntry>,
}

/// One day's assigned passages within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadingEntry {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Month name, denormalized for display.
    pub month_name: String,
    /// Comma-separated passage references, e.g. "Genesis 1, Matthew 1".
    pub reading: String,
}
