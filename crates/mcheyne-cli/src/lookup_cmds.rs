//! CLI handlers for read-only plan lookups.
//!
//! Implements:
//! - `mcheyne plans`                    -- list plans in the loaded document
//! - `mcheyne today [--plan]`           -- today's reading with passage links
//! - `mcheyne date <month> <day>`       -- reading for a calendar date
//! - `mcheyne all [--plan]`             -- every entry of a plan
//! - `mcheyne passage <ref> [--version]` -- Bible Gateway link for one passage

use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};

use mcheyne_core::passage::{bible_gateway_url, split_passages};
use mcheyne_core::plan::{PlanStore, ReadingEntry};
use mcheyne_core::resolve::{self, CalendarDate, PlanPosition};
use mcheyne_core::voice::LooseValue;

// -----------------------------------------------------------------------
// mcheyne plans
// -----------------------------------------------------------------------

/// One line per plan; the selected plan is starred.
pub fn render_plans(store: &PlanStore, selected: &str) -> String {
    let mut out = String::new();
    for plan in store.plans() {
        let marker = if plan.id == selected { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:<10} {:<16} {:>4} days  {}",
            plan.id, plan.name, plan.total_days, plan.description
        );
    }
    out
}

pub fn run_plans(store: &PlanStore, selected: &str) {
    if store.is_empty() {
        println!("No plans found.");
        return;
    }
    print!("{}", render_plans(store, selected));
}

// -----------------------------------------------------------------------
// mcheyne today / mcheyne date
// -----------------------------------------------------------------------

/// Parse CLI month/day arguments. The month may be a number or a name.
pub fn parse_date_args(month: &str, day: &str) -> Result<CalendarDate> {
    let month_num = LooseValue::Text(month.to_owned())
        .as_month()
        .ok_or_else(|| anyhow!("not a month: {month:?}"))?;
    let day_num: u32 = day
        .trim()
        .parse()
        .with_context(|| format!("day must be a number: {day:?}"))?;
    Ok(CalendarDate::new(month_num, day_num))
}

/// Heading, reading, then one Bible Gateway link per passage.
pub fn render_reading(
    heading: &str,
    entry: &ReadingEntry,
    version: &str,
    completed: bool,
) -> String {
    let mut out = String::new();
    let status = if completed { "  [done]" } else { "" };
    let _ = writeln!(out, "{heading}{status}");
    let _ = writeln!(out, "  {}", entry.reading);
    let _ = writeln!(out);
    for passage in split_passages(&entry.reading) {
        let _ = writeln!(out, "  {passage:<20} {}", bible_gateway_url(passage, version));
    }
    out
}

fn heading(store: &PlanStore, plan_id: &str, pos: &PlanPosition<'_>, today: bool) -> String {
    let plan_name = store.get(plan_id).map_or(plan_id, |p| p.name.as_str());
    let when = if today { "Today" } else { "Reading" };
    let year = if pos.cycle > 1 {
        format!(", year {}", pos.cycle)
    } else {
        String::new()
    };
    format!(
        "{when}, {} {}{year} ({plan_name})",
        pos.entry.month_name, pos.entry.day
    )
}

/// Find the entry for `date`: in the given cycle, or the first occurrence.
pub fn locate<'a>(
    store: &'a PlanStore,
    plan_id: &str,
    date: CalendarDate,
    cycle: Option<u32>,
) -> Result<PlanPosition<'a>> {
    let pos = match cycle {
        Some(cycle) => resolve::resolve_in_cycle(store, plan_id, date, cycle)?,
        None => resolve::occurrences(store, plan_id, date)?[0],
    };
    Ok(pos)
}

/// Resolve today's entry and render it.
pub fn today_text(
    store: &PlanStore,
    plan_id: &str,
    cycle: Option<u32>,
    version: &str,
    completed: impl Fn(usize) -> bool,
) -> Result<String> {
    let today = CalendarDate::today();
    let pos = locate(store, plan_id, today, cycle)
        .with_context(|| format!("no reading for today ({}/{})", today.month, today.day))?;
    Ok(render_reading(
        &heading(store, plan_id, &pos, true),
        pos.entry,
        version,
        completed(pos.index),
    ))
}

/// Resolve the entry for `date` and render it.
pub fn date_text(
    store: &PlanStore,
    plan_id: &str,
    date: CalendarDate,
    cycle: Option<u32>,
    version: &str,
    completed: impl Fn(usize) -> bool,
) -> Result<String> {
    let pos = locate(store, plan_id, date, cycle)?;
    Ok(render_reading(
        &heading(store, plan_id, &pos, false),
        pos.entry,
        version,
        completed(pos.index),
    ))
}

// -----------------------------------------------------------------------
// mcheyne all
// -----------------------------------------------------------------------

/// Every entry, grouped under "Year N - Month" headings. Entry numbers are
/// 1-based and accepted by `mcheyne done --entry`.
pub fn all_text(
    store: &PlanStore,
    plan_id: &str,
    completed: impl Fn(usize) -> bool,
) -> Result<String> {
    let plan = resolve::lookup_plan(store, plan_id)?;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} days)", plan.name, plan.total_days);

    let mut section = None;
    for pos in resolve::positions(&plan.readings) {
        let key = (pos.cycle, pos.entry.month);
        if section != Some(key) {
            section = Some(key);
            let _ = writeln!(out);
            let _ = writeln!(out, "Year {} - {}", pos.cycle, pos.entry.month_name);
        }
        let mark = if completed(pos.index) { 'x' } else { ' ' };
        let _ = writeln!(
            out,
            "[{mark}] {:>4}  {:>2}  {}",
            pos.index + 1,
            pos.entry.day,
            pos.entry.reading
        );
    }
    Ok(out)
}

// -----------------------------------------------------------------------
// mcheyne passage
// -----------------------------------------------------------------------

pub fn passage_text(passage: &str, version: &str) -> String {
    format!("{passage} ({version})\n  {}\n", bible_gateway_url(passage, version))
}
