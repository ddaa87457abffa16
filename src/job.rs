// Job runner: enumerate garages, ingest each (bounded concurrency), report.
// Repeated runs follow a cron schedule (local time) or a single run is made.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use futures_util::StreamExt;
use futures_util::stream;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::blob_store::BlobStoreError;
use crate::ingestion::{EntityOutcome, IngestionEngine};

/// Status string returned by a successful invocation.
pub const SUCCESS_STATUS: &str = "Success! Dashboard updated.";

#[derive(Debug, Clone)]
pub struct JobConfig {
    /// 1 = strictly sequential.
    pub max_concurrent_entities: usize,
    /// Deadline for one whole invocation.
    pub run_timeout: Duration,
    /// Zone used for "now" and therefore for which calendar day is ingested.
    pub timezone: Tz,
}

impl JobConfig {
    /// `at` in the configured zone, with the offset in effect at that instant.
    pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.timezone).fixed_offset()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFailure {
    pub entity_prefix: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Sorted by entity id.
    pub outcomes: Vec<EntityOutcome>,
    /// Sorted by entity prefix.
    pub failures: Vec<EntityFailure>,
}

impl RunReport {
    pub fn into_result(self) -> Result<RunReport, JobError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(JobError::EntitiesFailed {
                succeeded: self.outcomes.len(),
                failed: self.failures,
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("list entities: {0}")]
    Enumerate(#[source] BlobStoreError),
    #[error(
        "{} entities failed ({succeeded} succeeded): {}",
        .failed.len(),
        describe_failures(.failed)
    )]
    EntitiesFailed {
        failed: Vec<EntityFailure>,
        succeeded: usize,
    },
    #[error("run exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

fn describe_failures(failed: &[EntityFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{}: {}", f.entity_prefix, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Processes every entity once for the day of `now`. Entity failures are collected, not
/// propagated; enumeration failure and the deadline abort the run.
#[instrument(skip(engine, config, now), fields(operation = "run_once", date = %now.date_naive()))]
pub async fn run_once(
    engine: &IngestionEngine,
    config: &JobConfig,
    now: DateTime<FixedOffset>,
) -> Result<RunReport, JobError> {
    let work = async {
        let mut prefixes = engine.list_entities().await.map_err(JobError::Enumerate)?;
        prefixes.sort();
        prefixes.dedup();
        info!(entities = prefixes.len(), "processing entities");

        let results: Vec<_> = stream::iter(prefixes)
            .map(|prefix| async move {
                let result = engine.process_entity(&prefix, now).await;
                (prefix, result)
            })
            .buffer_unordered(config.max_concurrent_entities.max(1))
            .collect()
            .await;

        let mut report = RunReport::default();
        for (prefix, result) in results {
            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    error!(entity = %prefix, error = %e, "entity failed");
                    report.failures.push(EntityFailure {
                        entity_prefix: prefix,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.outcomes.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        report
            .failures
            .sort_by(|a, b| a.entity_prefix.cmp(&b.entity_prefix));
        Ok::<_, JobError>(report)
    };

    tokio::time::timeout(config.run_timeout, work)
        .await
        .map_err(|_| JobError::DeadlineExceeded(config.run_timeout))?
}

/// One invocation at the current time. Any failed entity fails the invocation.
pub async fn invoke(
    engine: &IngestionEngine,
    config: &JobConfig,
) -> Result<&'static str, JobError> {
    let now = config.local_time(Utc::now());
    let report = run_once(engine, config, now).await?.into_result()?;
    let updated = report.outcomes.iter().filter(|o| o.day_updated).count();
    info!(
        entities = report.outcomes.len(),
        days_updated = updated,
        "run complete"
    );
    Ok(SUCCESS_STATUS)
}

/// Invokes the job at each cron time, read in the configured zone, until `shutdown` fires.
/// A failed invocation is logged; the next scheduled run retries it.
pub async fn run_scheduled(
    engine: Arc<IngestionEngine>,
    config: JobConfig,
    cron_expr: &str,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let schedule = cron::Schedule::from_str(cron_expr)
        .map_err(|e| anyhow::anyhow!("invalid schedule.cron {:?}: {}", cron_expr, e))?;

    loop {
        let now = Utc::now().with_timezone(&config.timezone);
        let Some(next) = schedule.after(&now).next() else {
            warn!(cron = %cron_expr, "schedule has no upcoming runs; stopping");
            return Ok(());
        };
        let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
        info!(next_run = %next, "waiting for next run");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match invoke(&engine, &config).await {
                    Ok(status) => info!(status, "scheduled run finished"),
                    Err(e) => error!(error = %e, "scheduled run failed"),
                }
            }
            _ = &mut shutdown => {
                info!("scheduler shutting down");
                return Ok(());
            }
        }
    }
}
