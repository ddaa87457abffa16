// One parsed row of a raw metrics export.

use thiserror::Error;

pub const COL_TIMESTAMP: usize = 0;
pub const COL_CPU_PERCENT: usize = 2;
pub const COL_RAM_PERCENT: usize = 4;
pub const COL_DISK_TOTAL_BYTES: usize = 5;
pub const COL_DISK_PERCENT: usize = 6;

/// Why a row was not turned into a [`Sample`]. Rows with these errors are skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("missing column {0}")]
    MissingColumn(usize),
    #[error("column {column}: invalid number {value:?}")]
    InvalidNumber { column: usize, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: String,
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub disk_total_bytes: u64,
    pub disk_percent: f64,
}

impl Sample {
    /// Parses the fixed export layout: timestamp, _, cpu%, _, ram%, disk total bytes, disk%.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, SampleError> {
        let timestamp = field(fields, COL_TIMESTAMP)?.to_string();
        Ok(Self {
            timestamp,
            cpu_percent: parse_finite(fields, COL_CPU_PERCENT)?,
            ram_percent: parse_finite(fields, COL_RAM_PERCENT)?,
            disk_total_bytes: parse_field(fields, COL_DISK_TOTAL_BYTES)?,
            disk_percent: parse_finite(fields, COL_DISK_PERCENT)?,
        })
    }

    /// `round(disk_total_bytes * disk_percent / 100)`; NaN or negative results clamp to 0.
    pub fn disk_used_bytes(&self) -> u64 {
        let used = (self.disk_total_bytes as f64 * self.disk_percent / 100.0).round();
        used as u64
    }
}

fn field<S: AsRef<str>>(fields: &[S], column: usize) -> Result<&str, SampleError> {
    fields
        .get(column)
        .map(|f| f.as_ref())
        .ok_or(SampleError::MissingColumn(column))
}

fn parse_field<S: AsRef<str>, T: std::str::FromStr>(
    fields: &[S],
    column: usize,
) -> Result<T, SampleError> {
    let raw = field(fields, column)?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(fields, column))
}

/// Like `parse_field`, but `NaN`, `inf` and `infinity` are rejected too.
fn parse_finite<S: AsRef<str>>(fields: &[S], column: usize) -> Result<f64, SampleError> {
    let value: f64 = parse_field(fields, column)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(fields, column))
    }
}

fn invalid<S: AsRef<str>>(fields: &[S], column: usize) -> SampleError {
    SampleError::InvalidNumber {
        column,
        value: fields
            .get(column)
            .map(|f| f.as_ref().to_string())
            .unwrap_or_default(),
    }
}
