// Monthly rollup over the daily history. Recomputed from scratch on every run.

use std::collections::BTreeMap;

use chrono::{Datelike, Month, Months, NaiveDate};

use crate::models::{DailyStats, MonthlySummary};

use super::rounding::round2;

/// Which semantics apply to the summarized month; chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthKind {
    /// Month in progress: projected linearly to the full month length.
    Current,
    /// Finished month: projection equals the total.
    Closed,
}

/// Summary of the calendar month containing `reference`.
pub fn monthly_summary(
    history: &BTreeMap<NaiveDate, DailyStats>,
    reference: NaiveDate,
    kind: MonthKind,
) -> MonthlySummary {
    let sum_gb: f64 = history
        .iter()
        .filter(|(date, _)| date.year() == reference.year() && date.month() == reference.month())
        .map(|(_, stats)| stats.daily_ingested_gb)
        .sum();
    let total_ingested_gb = round2(sum_gb);

    let projection_gb = match kind {
        MonthKind::Current => project_month(sum_gb, reference.day(), days_in_month(reference)),
        MonthKind::Closed => total_ingested_gb,
    };

    MonthlySummary {
        month_name: month_name(reference),
        total_ingested_gb,
        projection_gb,
    }
}

/// `(sum_gb / day_of_month) * days_in_month`, rounded; 0.0 when day_of_month is 0.
pub fn project_month(sum_gb: f64, day_of_month: u32, days_in_month: u32) -> f64 {
    if day_of_month == 0 {
        return 0.0;
    }
    round2(sum_gb / day_of_month as f64 * days_in_month as f64)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        // Only reachable in the last month chrono can represent (December).
        None => 31,
    }
}

/// Same day one month earlier, clamped to the end of that month (Mar 31 -> Feb 28/29).
pub fn previous_month(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(1)).unwrap_or(date)
}

fn month_name(date: NaiveDate) -> Option<String> {
    u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_uppercase())
}
