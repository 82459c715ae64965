//! CLI handlers for per-user reading state.
//!
//! Implements:
//! - `mcheyne done [<month> <day>] [--year N | --entry N]` -- toggle completion of a plan entry
//! - `mcheyne progress`             -- completed / total for a plan
//! - `mcheyne plan use <plan-id>`   -- remember the selected plan
//! - `mcheyne theme`                -- toggle the stored light/dark theme
//!
//! State is kept in a JSON file (see [`crate::config::state_path`]); the
//! server never sees it.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use mcheyne_core::client_state::{ClientState, JsonFileStore, KeyValueStore};
use mcheyne_core::plan::PlanStore;
use mcheyne_core::resolve::{self, CalendarDate, PlanPosition};

/// Open the on-disk client state.
pub fn open_state() -> Result<ClientState<JsonFileStore>> {
    let path = crate::config::state_path();
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("failed to open client state at {}", path.display()))?;
    Ok(ClientState::new(store))
}

// -----------------------------------------------------------------------
// mcheyne done
// -----------------------------------------------------------------------

/// Which plan entry `mcheyne done` acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneTarget {
    /// A calendar date, optionally pinned to one year of a multi-year plan.
    /// Unpinned, the earliest unfinished occurrence is marked; once every
    /// occurrence is finished the latest one is unmarked.
    Date { date: CalendarDate, cycle: Option<u32> },
    /// A 1-based entry number as listed by `mcheyne all`.
    Entry(usize),
}

fn pick_position<'a, S: KeyValueStore>(
    state: &ClientState<S>,
    store: &'a PlanStore,
    plan_id: &str,
    target: DoneTarget,
) -> Result<PlanPosition<'a>> {
    match target {
        DoneTarget::Date {
            date,
            cycle: Some(cycle),
        } => Ok(resolve::resolve_in_cycle(store, plan_id, date, cycle)?),
        DoneTarget::Date { date, cycle: None } => {
            let found = resolve::occurrences(store, plan_id, date)?;
            let pos = found
                .iter()
                .find(|p| !state.is_completed(plan_id, p.index))
                .or_else(|| found.last())
                .copied()
                .context("date has no occurrences")?;
            Ok(pos)
        }
        DoneTarget::Entry(number) => {
            let plan = resolve::lookup_plan(store, plan_id)?;
            let len = plan.readings.len();
            match number.checked_sub(1).and_then(|i| resolve::positions(&plan.readings).nth(i)) {
                Some(pos) => Ok(pos),
                None => bail!("entry {number} is out of range (1-{len})"),
            }
        }
    }
}

/// Toggle the completion state of one entry of `plan_id`. Returns the
/// message to print.
pub fn toggle_done<S: KeyValueStore>(
    state: &mut ClientState<S>,
    store: &PlanStore,
    plan_id: &str,
    target: DoneTarget,
    now: DateTime<Utc>,
) -> Result<String> {
    let pos = pick_position(state, store, plan_id, target)?;
    let complete = state.toggle_completed(plan_id, pos.index, now)?;
    let verb = if complete { "Marked" } else { "Unmarked" };
    let year = if pos.cycle > 1 {
        format!(", year {}", pos.cycle)
    } else {
        String::new()
    };
    Ok(format!(
        "{verb} {} {}{year} ({}) as complete.",
        pos.entry.month_name, pos.entry.day, pos.entry.reading
    ))
}

// -----------------------------------------------------------------------
// mcheyne progress
// -----------------------------------------------------------------------

pub fn progress_text<S: KeyValueStore>(
    state: &ClientState<S>,
    store: &PlanStore,
    plan_id: &str,
) -> Result<String> {
    let plan = resolve::lookup_plan(store, plan_id)?;
    let progress = state.progress(plan_id, plan.total_days);
    Ok(format!(
        "{}: {} / {} readings complete ({:.1}%)",
        plan.name, progress.completed, progress.total, progress.percentage
    ))
}

// -----------------------------------------------------------------------
// mcheyne plan use
// -----------------------------------------------------------------------

pub fn use_plan<S: KeyValueStore>(
    state: &mut ClientState<S>,
    store: &PlanStore,
    plan_id: &str,
) -> Result<String> {
    let Some(plan) = store.get(plan_id) else {
        bail!(
            "unknown plan {plan_id:?} (available: {})",
            store.plan_ids().join(", ")
        );
    };
    state.set_selected_plan(plan_id)?;
    Ok(format!("Now following the {}.", plan.name))
}

// -----------------------------------------------------------------------
// mcheyne theme
// -----------------------------------------------------------------------

pub fn toggle_theme<S: KeyValueStore>(state: &mut ClientState<S>) -> Result<String> {
    let theme = state.toggle_theme()?;
    Ok(format!("Theme set to {}.", theme.as_str()))
}
