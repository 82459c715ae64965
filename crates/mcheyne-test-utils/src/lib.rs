//! Shared test fixtures for mcheyne integration tests.
//!
//! Provides a small reading-plan document with three plans:
//! - **`12_month`**: one entry for every calendar day of a leap year
//!   (366 readings), so "today" always resolves. January 1st carries the
//!   real M'Cheyne reading.
//! - **`24_month`**: two cycles over January 1st-3rd, so calendar dates
//!   repeat and first-match behaviour can be observed.
//! - **`48_month`**: a handful of entries, including no February 29th.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde_json::{Value, json};
use tempfile::TempDir;

use mcheyne_core::plan::PlanStore;
use mcheyne_core::resolve::month_name;

/// Reading assigned to January 1st in the `12_month` fixture.
pub const NEW_YEARS_READING: &str = "Genesis 1, Matthew 1, Ezra 1, Acts 1";

const DAYS_IN_LEAP_YEAR: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

static SAMPLE_JSON: OnceLock<String> = OnceLock::new();

fn entry(month: u32, day: u32, reading: &str) -> Value {
    json!({
        "month": month,
        "day": day,
        "month_name": month_name(month).unwrap_or("Unknown"),
        "reading": reading,
    })
}

fn build_document() -> Value {
    let mut year = Vec::with_capacity(366);
    let mut n = 0u32;
    for (idx, days) in DAYS_IN_LEAP_YEAR.iter().enumerate() {
        let month = idx as u32 + 1;
        for day in 1..=*days {
            n += 1;
            let reading = if n == 1 {
                NEW_YEARS_READING.to_owned()
            } else {
                format!("Genesis {n}, Matthew {n}, Ezra {n}, Acts {n}")
            };
            year.push(entry(month, day, &reading));
        }
    }

    let two_year = vec![
        entry(1, 1, "Genesis 1, Matthew 1"),
        entry(1, 2, "Genesis 2, Matthew 2"),
        entry(1, 3, "Genesis 3, Matthew 3"),
        entry(1, 1, "Ezra 1, Acts 1"),
        entry(1, 2, "Ezra 2, Acts 2"),
        entry(1, 3, "Ezra 3, Acts 3"),
    ];

    let four_year = vec![
        entry(1, 1, "Genesis 1"),
        entry(2, 28, "Genesis 59"),
        entry(3, 1, "Genesis 60"),
    ];

    json!({
        "title": "M'Cheyne Bible Reading Plan",
        "description": "Daily Bible reading plans for completing the entire Bible",
        "plans": {
            "12_month": {
                "name": "12 Month Plan",
                "description": "Complete the Bible in 1 year with 4 chapters per day",
                "total_days": year.len(),
                "readings": year,
            },
            "24_month": {
                "name": "24 Month Plan",
                "description": "Complete the Bible in 2 years with 2 chapters per day",
                "total_days": two_year.len(),
                "readings": two_year,
            },
            "48_month": {
                "name": "48 Month Plan",
                "description": "Complete the Bible in 4 years with a more relaxed pace",
                "total_days": four_year.len(),
                "readings": four_year,
            },
        },
        "metadata": {"source": "fixture"}
    })
}

/// The fixture document as a JSON string.
pub fn sample_document_json() -> &'static str {
    SAMPLE_JSON.get_or_init(|| build_document().to_string())
}

/// A store built from the fixture document.
pub fn sample_store() -> Arc<PlanStore> {
    let store = PlanStore::from_json(sample_document_json()).expect("fixture document is valid");
    Arc::new(store)
}

/// Write the fixture document into a fresh temp dir.
///
/// Returns `(dir, path)`; keep `dir` alive for as long as the file is needed.
pub fn write_sample_file() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("reading_plan.json");
    std::fs::write(&path, sample_document_json()).expect("failed to write fixture document");
    (dir, path)
}
