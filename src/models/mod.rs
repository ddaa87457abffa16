// Domain models: raw samples and the dashboard document

mod dashboard;
mod sample;

pub use dashboard::{CurrentStatus, DailyStats, DashboardData, MonthlySummary};
pub use sample::{
    COL_CPU_PERCENT, COL_DISK_PERCENT, COL_DISK_TOTAL_BYTES, COL_RAM_PERCENT, COL_TIMESTAMP,
    Sample, SampleError,
};
