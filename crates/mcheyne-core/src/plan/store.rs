//! The in-memory plan store.
//!
//! Built once from a validated [`PlanDocument`] and read-only afterwards.
//! Callers share it behind an `Arc`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::json_format::{PlanDocument, ReadingEntry};
use super::parser::{PlanLoadError, parse_plan_document};

/// A named reading schedule with its ordered daily entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_days: u32,
    pub readings: Vec<ReadingEntry>,
}

/// Listing view of a plan, as returned by `GET /api/plans`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_days: u32,
}

impl From<&ReadingPlan> for PlanSummary {
    fn from(p: &ReadingPlan) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            total_days: p.total_days,
        }
    }
}

/// Immutable mapping from plan identifier to [`ReadingPlan`].
#[derive(Debug, Clone, Default)]
pub struct PlanStore {
    plans: BTreeMap<String, ReadingPlan>,
}

impl PlanStore {
    /// Build a store from an already-validated document.
    pub fn from_document(doc: PlanDocument) -> Self {
        let plans = doc
            .plans
            .into_iter()
            .map(|(id, p)| {
                let plan = ReadingPlan {
                    id: id.clone(),
                    name: p.name,
                    description: p.description,
                    total_days: p.total_days,
                    readings: p.readings,
                };
                (id, plan)
            })
            .collect();
        Self { plans }
    }

    /// Parse, validate and build a store from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, PlanLoadError> {
        parse_plan_document(content).map(Self::from_document)
    }

    /// Load the store from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, PlanLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            plans = ?store.plan_ids(),
            "reading plan data loaded"
        );
        Ok(store)
    }

    /// Look up a plan by identifier.
    pub fn get(&self, plan_id: &str) -> Option<&ReadingPlan> {
        self.plans.get(plan_id)
    }

    /// All plans, sorted by identifier.
    pub fn plans(&self) -> impl Iterator<Item = &ReadingPlan> {
        self.plans.values()
    }

    pub fn plan_ids(&self) -> Vec<&str> {
        self.plans.keys().map(String::as_str).collect()
    }

    pub fn summaries(&self) -> Vec<PlanSummary> {
        self.plans().map(PlanSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
