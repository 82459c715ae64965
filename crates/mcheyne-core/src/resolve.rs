//! Date resolution: map a (plan, month, day) onto a reading entry.
//!
//! Resolution is a first-match linear scan over the plan's readings. Plans
//! spanning several years repeat calendar dates; the earliest entry in list
//! order wins.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::{PlanStore, ReadingEntry, ReadingPlan};

/// Negative resolution outcomes. Both are expected results, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown plan: {0:?}")]
    UnknownPlan(String),

    #[error("no reading in plan {plan:?} for {month}/{day}")]
    NoReadingForDate { plan: String, month: u32, day: u32 },
}

/// A calendar month/day, with the year attached when it came from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub month: u32,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CalendarDate {
    /// A date without a year, as supplied by a caller.
    pub fn new(month: u32, day: u32) -> Self {
        Self {
            month,
            day,
            year: None,
        }
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
            year: Some(date.year()),
        }
    }

    /// Today's date in the server's local timezone.
    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive())
    }
}

/// Find the first entry in `plan_id` matching `month`/`day`.
pub fn resolve<'a>(
    store: &'a PlanStore,
    plan_id: &str,
    month: u32,
    day: u32,
) -> Result<&'a ReadingEntry, ResolveError> {
    let plan = lookup_plan(store, plan_id)?;
    plan.readings
        .iter()
        .find(|r| r.month == month && r.day == day)
        .ok_or_else(|| ResolveError::NoReadingForDate {
            plan: plan_id.to_owned(),
            month,
            day,
        })
}

/// Resolve against a full calendar date.
pub fn resolve_date<'a>(
    store: &'a PlanStore,
    plan_id: &str,
    date: CalendarDate,
) -> Result<&'a ReadingEntry, ResolveError> {
    resolve(store, plan_id, date.month, date.day)
}

/// Resolve today's reading using the local wall clock.
///
/// Returns the date used alongside the entry so callers can echo it back.
pub fn resolve_today<'a>(
    store: &'a PlanStore,
    plan_id: &str,
) -> (CalendarDate, Result<&'a ReadingEntry, ResolveError>) {
    let today = CalendarDate::today();
    (today, resolve_date(store, plan_id, today))
}

/// Every reading in a plan, in schedule order.
pub fn all_readings<'a>(
    store: &'a PlanStore,
    plan_id: &str,
) -> Result<&'a [ReadingEntry], ResolveError> {
    lookup_plan(store, plan_id).map(|p| p.readings.as_slice())
}

/// Look up a plan or report it as unknown.
pub fn lookup_plan<'a>(store: &'a PlanStore, plan_id: &str) -> Result<&'a ReadingPlan, ResolveError> {
    store
        .get(plan_id)
        .ok_or_else(|| ResolveError::UnknownPlan(plan_id.to_owned()))
}

/// An entry together with its position in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPosition<'a> {
    /// 0-based index into the plan's readings.
    pub index: usize,
    /// 1-based pass through the calendar ("year 2" of a two-year plan).
    pub cycle: u32,
    pub entry: &'a ReadingEntry,
}

/// Walk a plan's readings in order, numbering cycles from 1.
///
/// A new cycle starts whenever the calendar date does not move forward.
pub fn positions(readings: &[ReadingEntry]) -> impl Iterator<Item = PlanPosition<'_>> {
    let mut cycle = 1;
    let mut prev: Option<(u32, u32)> = None;
    readings.iter().enumerate().map(move |(index, entry)| {
        let date = (entry.month, entry.day);
        if prev.is_some_and(|p| date <= p) {
            cycle += 1;
        }
        prev = Some(date);
        PlanPosition {
            index,
            cycle,
            entry,
        }
    })
}

/// The entry for `date` within the given 1-based `cycle` of a plan.
pub fn resolve_in_cycle<'a>(
    store: &'a PlanStore,
    plan_id: &str,
    date: CalendarDate,
    cycle: u32,
) -> Result<PlanPosition<'a>, ResolveError> {
    let plan = lookup_plan(store, plan_id)?;
    positions(&plan.readings)
        .find(|p| p.cycle == cycle && p.entry.month == date.month && p.entry.day == date.day)
        .ok_or_else(|| ResolveError::NoReadingForDate {
            plan: plan_id.to_owned(),
            month: date.month,
            day: date.day,
        })
}

/// Every occurrence of `date` in a plan, one per cycle that carries it.
pub fn occurrences<'a>(
    store: &'a PlanStore,
    plan_id: &str,
    date: CalendarDate,
) -> Result<Vec<PlanPosition<'a>>, ResolveError> {
    let plan = lookup_plan(store, plan_id)?;
    let found: Vec<_> = positions(&plan.readings)
        .filter(|p| p.entry.month == date.month && p.entry.day == date.day)
        .collect();
    if found.is_empty() {
        return Err(ResolveError::NoReadingForDate {
            plan: plan_id.to_owned(),
            month: date.month,
            day: date.day,
        });
    }
    Ok(found)
}

/// English month name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
}

/// Case-insensitive month name to 1-based month number.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().to_lowercase();
    (1..=12).find(|&m| month_name(m).is_some_and(|n| n.to_lowercase() == lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"plans": {
        "24_month": {"name": "24 Month Plan", "description": "", "total_days": 3, "readings": [
            {"month": 1, "day": 1, "month_name": "January", "reading": "Genesis 1"},
            {"month": 1, "day": 2, "month_name": "January", "reading": "Genesis 2"},
            {"month": 1, "day": 1, "month_name": "January", "reading": "Genesis 26"}
        ]}
    }}"#;

    fn store() -> PlanStore {
        PlanStore::from_json(DOC).unwrap()
    }

    #[test]
    fn resolves_matching_entry() {
        let store = store();
        let entry = resolve(&store, "24_month", 1, 2).unwrap();
        assert_eq!(entry.reading, "Genesis 2");
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_dates() {
        let store = store();
        let entry = resolve(&store, "24_month", 1, 1).unwrap();
        assert_eq!(entry.reading, "Genesis 1");
    }

    #[test]
    fn unknown_plan_regardless_of_date() {
        let store = store();
        for (m, d) in [(1, 1), (2, 30), (0, 0)] {
            assert_eq!(
                resolve(&store, "6_month", m, d).unwrap_err(),
                ResolveError::UnknownPlan("6_month".into())
            );
        }
    }

    #[test]
    fn absent_date_is_no_reading() {
        let store = store();
        let err = resolve(&store, "24_month", 2, 30).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NoReadingForDate {
                plan: "24_month".into(),
                month: 2,
                day: 30
            }
        );
    }

    #[test]
    fn positions_number_cycles_when_dates_wrap() {
        let store = store();
        let cycles: Vec<(usize, u32)> = positions(&store.get("24_month").unwrap().readings)
            .map(|p| (p.index, p.cycle))
            .collect();
        assert_eq!(cycles, vec![(0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn resolve_in_cycle_picks_later_occurrence() {
        let store = store();
        let date = CalendarDate::new(1, 1);
        let second = resolve_in_cycle(&store, "24_month", date, 2).unwrap();
        assert_eq!((second.index, second.entry.reading.as_str()), (2, "Genesis 26"));
        assert_eq!(resolve_in_cycle(&store, "24_month", date, 1).unwrap().index, 0);
        assert!(resolve_in_cycle(&store, "24_month", CalendarDate::new(1, 2), 2).is_err());
    }

    #[test]
    fn occurrences_lists_each_cycle() {
        let store = store();
        let found = occurrences(&store, "24_month", CalendarDate::new(1, 1)).unwrap();
        let indices: Vec<usize> = found.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(occurrences(&store, "24_month", CalendarDate::new(2, 30)).is_err());
    }

    #[test]
    fn all_readings_preserves_order() {
        let store = store();
        let readings = all_readings(&store, "24_month").unwrap();
        let texts: Vec<&str> = readings.iter().map(|r| r.reading.as_str()).collect();
        assert_eq!(texts, vec!["Genesis 1", "Genesis 2", "Genesis 26"]);
    }

    #[test]
    fn calendar_date_from_naive_carries_year() {
        let date = CalendarDate::from_naive(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(date, CalendarDate { month: 3, day: 15, year: Some(2026) });
    }

    #[test]
    fn calendar_date_without_year_omits_field() {
        let json = serde_json::to_value(CalendarDate::new(2, 30)).unwrap();
        assert_eq!(json, serde_json::json!({"month": 2, "day": 30}));
    }

    #[test]
    fn month_names_round_trip() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(month_from_name("march"), Some(3));
        assert_eq!(month_from_name(" DECEMBER "), Some(12));
        assert_eq!(month_from_name("Smarch"), None);
    }
}
