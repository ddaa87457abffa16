// Pure aggregation: raw rows -> DailyStats, daily history -> MonthlySummary.
// Storage access stays in ingestion.

pub mod daily;
pub mod monthly;
pub mod rounding;

pub use daily::{DailyAccumulator, DayAggregate, aggregate_day};
pub use monthly::{MonthKind, days_in_month, monthly_summary, previous_month, project_month};
pub use rounding::{bytes_to_gb, round2, round_to};
