// Persisted per-garage dashboard document and its parts.
// Wire names are camelCase; decode ignores unknown fields and fills missing ones with defaults.
// A null number (how JSON writers emit NaN) decodes as 0.0.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Latest valid sample of the most recent run that found data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentStatus {
    #[serde(deserialize_with = "f64_or_zero")]
    pub cpu_percent: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub ram_percent: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub disk_percent: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub total_storage_gb: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub used_storage_gb: f64,
    /// Timestamp column of the source row, kept verbatim.
    pub timestamp_str: Option<String>,
}

/// One calendar day of aggregated samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyStats {
    #[serde(deserialize_with = "f64_or_zero")]
    pub avg_cpu_percent: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub avg_ram_percent: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub avg_disk_percent: f64,
    /// Net disk growth over the day (max used - min used), in GB.
    #[serde(deserialize_with = "f64_or_zero")]
    pub daily_ingested_gb: f64,
    pub data_points_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlySummary {
    /// Upper-case English month name, e.g. "MARCH".
    pub month_name: Option<String>,
    #[serde(deserialize_with = "f64_or_zero")]
    pub total_ingested_gb: f64,
    #[serde(deserialize_with = "f64_or_zero")]
    pub projection_gb: f64,
}

/// Dashboard document, one per garage, stored at `<prefix>dashboard_<id>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardData {
    #[serde(rename = "garageId", alias = "entityId")]
    pub entity_id: String,
    pub last_update: Option<DateTime<FixedOffset>>,
    pub current_status: CurrentStatus,
    pub current_month_summary: MonthlySummary,
    pub last_month_summary: MonthlySummary,
    /// Keyed by ISO date; a rerun for a date replaces that entry.
    pub history: BTreeMap<NaiveDate, DailyStats>,
}

impl DashboardData {
    /// Fresh document with only the identity set.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Default::default()
        }
    }

    /// Replaces the day's entry and the current status with one run's aggregate.
    pub fn apply_day(&mut self, date: NaiveDate, stats: DailyStats, status: CurrentStatus) {
        self.history.insert(date, stats);
        self.current_status = status;
    }
}

fn f64_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
