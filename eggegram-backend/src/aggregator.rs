//! Rolling-week aggregation over ledger rows.
//!
//! All functions are pure: they take the full row set plus "today" and
//! never touch the store. Rows whose date is not a canonical `YYYY-MM-DD`
//! string are skipped. When several rows share a date, the first one in
//! store order wins and the rest are ignored (never summed).

use chrono::{Duration, NaiveDate};
use egg_ledger_types::DayRecord;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Days in the rolling window, today included.
pub const WEEK_DAYS: i64 = 7;

/// One line of the weekly breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

impl DayCount {
    /// Short weekday + month/day, e.g. `Sat 06/01`.
    pub fn label(&self) -> String {
        self.date.format("%a %m/%d").to_string()
    }
}

/// `[today - 6 days, today]`, inclusive at both ends.
pub fn week_window(today: NaiveDate) -> RangeInclusive<NaiveDate> {
    (today - Duration::days(WEEK_DAYS - 1))..=today
}

/// Count recorded for `today`, or 0 when there is no row for it.
pub fn today_total(records: &[DayRecord], today: NaiveDate) -> u32 {
    records
        .iter()
        .find(|r| r.is_on(today))
        .map_or(0, |r| r.count)
}

/// Seven entries, newest first, one per day of the window. Missing days are 0.
pub fn week_breakdown(records: &[DayRecord], today: NaiveDate) -> Vec<DayCount> {
    let window = week_window(today);
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();

    for record in records {
        let Some(date) = record.calendar_date() else {
            continue;
        };
        if !window.contains(&date) {
            continue;
        }
        if counts.contains_key(&date) {
            log::warn!(
                "Ledger has more than one row for {}; using the first",
                record.date.trim()
            );
            continue;
        }
        counts.insert(date, record.count);
    }

    (0..WEEK_DAYS)
        .map(|offset| {
            let date = today - Duration::days(offset);
            DayCount {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Sum of the week's breakdown.
pub fn week_total(records: &[DayRecord], today: NaiveDate) -> u32 {
    sum_counts(&week_breakdown(records, today))
}

fn sum_counts(days: &[DayCount]) -> u32 {
    days.iter().fold(0u32, |acc, d| acc.saturating_add(d.count))
}

/// Today's total, the week total and the breakdown, all from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyStats {
    pub today: u32,
    pub week_total: u32,
    pub breakdown: Vec<DayCount>,
}

impl WeeklyStats {
    pub fn compute(records: &[DayRecord], today: NaiveDate) -> Self {
        let breakdown = week_breakdown(records, today);
        Self {
            today: today_total(records, today),
            week_total: sum_counts(&breakdown),
            breakdown,
        }
    }
}
