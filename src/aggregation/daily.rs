// Daily aggregation: every valid row of every export for one day -> one DailyStats
// plus the CurrentStatus of the last valid row (file order, then row order).

use crate::models::{CurrentStatus, DailyStats, Sample, SampleError};
use crate::rows::RowReader;

use super::rounding::{bytes_to_gb, round2};

/// Result of aggregating one day with at least one valid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAggregate {
    pub stats: DailyStats,
    pub status: CurrentStatus,
    /// Rows dropped because they did not parse (headers excluded).
    pub rows_skipped: usize,
}

/// Running sums and disk-usage extremes across all files of a day.
#[derive(Debug, Default)]
pub struct DailyAccumulator {
    sum_cpu: f64,
    sum_ram: f64,
    sum_disk: f64,
    count: u32,
    min_used_bytes: Option<u64>,
    max_used_bytes: Option<u64>,
    last: Option<Sample>,
    rows_skipped: usize,
}

impl DailyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        let used = sample.disk_used_bytes();
        self.min_used_bytes = Some(self.min_used_bytes.map_or(used, |m| m.min(used)));
        self.max_used_bytes = Some(self.max_used_bytes.map_or(used, |m| m.max(used)));

        self.sum_cpu += sample.cpu_percent;
        self.sum_ram += sample.ram_percent;
        self.sum_disk += sample.disk_percent;
        self.count += 1;
        self.last = Some(sample);
    }

    /// Parses one data row; on error the row is counted as skipped and nothing else changes.
    pub fn push_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), SampleError> {
        match Sample::from_fields(fields) {
            Ok(sample) => {
                self.push(sample);
                Ok(())
            }
            Err(e) => {
                self.rows_skipped += 1;
                Err(e)
            }
        }
    }

    /// Feeds one CSV export. The first line is a header; bad rows are skipped.
    pub fn push_file(&mut self, reader: &dyn RowReader, input: &[u8]) {
        for row in reader.read_rows(input).into_iter().skip(1) {
            let result = match row {
                Ok(fields) => self.push_fields(fields.as_slice()),
                Err(e) => {
                    self.rows_skipped += 1;
                    tracing::trace!(error = %e, "unreadable row skipped");
                    continue;
                }
            };
            if let Err(e) = result {
                tracing::trace!(error = %e, "malformed row skipped");
            }
        }
    }

    /// `None` when no valid sample was seen; such a day gets no history entry.
    pub fn finish(self) -> Option<DayAggregate> {
        let last = self.last?;
        let n = self.count as f64;
        let min_used = self.min_used_bytes.unwrap_or(0);
        let max_used = self.max_used_bytes.unwrap_or(0);

        let stats = DailyStats {
            avg_cpu_percent: round2(self.sum_cpu / n),
            avg_ram_percent: round2(self.sum_ram / n),
            avg_disk_percent: round2(self.sum_disk / n),
            daily_ingested_gb: bytes_to_gb(max_used.saturating_sub(min_used)),
            data_points_count: self.count,
        };
        let status = CurrentStatus {
            cpu_percent: last.cpu_percent,
            ram_percent: last.ram_percent,
            disk_percent: last.disk_percent,
            total_storage_gb: bytes_to_gb(last.disk_total_bytes),
            used_storage_gb: bytes_to_gb(last.disk_used_bytes()),
            timestamp_str: Some(last.timestamp),
        };

        Some(DayAggregate {
            stats,
            status,
            rows_skipped: self.rows_skipped,
        })
    }
}

/// Aggregates the day's exports, which must already be in source-filename order.
pub fn aggregate_day<'a, I>(reader: &dyn RowReader, files: I) -> Option<DayAggregate>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut acc = DailyAccumulator::new();
    for input in files {
        acc.push_file(reader, input);
    }
    acc.finish()
}
