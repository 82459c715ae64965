//! Reading plans: JSON document format, validation, and the in-memory store.

pub mod json_format;
pub mod parser;
pub mod store;

pub use json_format::{PlanDocument, PlanJson, ReadingEntry};
pub use parser::{PlanLoadError, parse_plan_document};
pub use store::{PlanStore, PlanSummary, ReadingPlan};

/// Plan used when a request does not name one.
pub const DEFAULT_PLAN: &str = "12_month";
