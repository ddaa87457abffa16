// Per-garage ingestion: load (or create) the dashboard, fold in today's exports,
// recompute monthly summaries, write the dashboard back.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::aggregation::{MonthKind, aggregate_day, monthly_summary, previous_month};
use crate::blob_store::{BlobStore, BlobStoreError};
use crate::codec::{CodecError, DocumentCodec};
use crate::models::DashboardData;
use crate::paths;
use crate::rows::RowReader;
use crate::staging::StagingArea;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("storage: {0}")]
    Storage(#[from] BlobStoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("staging {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a loaded dashboard came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    Stored,
    /// No document yet; a fresh one was created.
    Missing,
    /// Stored document did not decode; replaced by a fresh one.
    Corrupt,
}

/// What one entity's run did.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityOutcome {
    pub entity_id: String,
    pub dashboard_key: String,
    pub origin: DocumentOrigin,
    pub date: NaiveDate,
    pub blobs_found: usize,
    /// True when today's history entry and current status were replaced.
    pub day_updated: bool,
    pub data_points: u32,
    pub rows_skipped: usize,
}

/// Stores, codec, reader, and scratch location for the engine.
pub struct IngestionDeps {
    /// Bucket holding raw daily exports; also the source of the entity list.
    pub raw_store: Arc<dyn BlobStore>,
    /// Bucket holding dashboard documents.
    pub dashboard_store: Arc<dyn BlobStore>,
    pub codec: Arc<dyn DocumentCodec>,
    pub row_reader: Arc<dyn RowReader>,
    pub staging_root: PathBuf,
}

pub struct IngestionEngine {
    raw_store: Arc<dyn BlobStore>,
    dashboard_store: Arc<dyn BlobStore>,
    codec: Arc<dyn DocumentCodec>,
    row_reader: Arc<dyn RowReader>,
    staging_root: PathBuf,
}

impl IngestionEngine {
    pub fn new(deps: IngestionDeps) -> Self {
        let IngestionDeps {
            raw_store,
            dashboard_store,
            codec,
            row_reader,
            staging_root,
        } = deps;
        Self {
            raw_store,
            dashboard_store,
            codec,
            row_reader,
            staging_root,
        }
    }

    /// Entity prefixes (`idGaragem=42/`) found at the top of the raw bucket.
    #[instrument(skip(self), fields(operation = "list_entities"))]
    pub async fn list_entities(&self) -> Result<Vec<String>, BlobStoreError> {
        self.raw_store
            .list_common_prefixes(paths::PREFIX_DELIMITER)
            .await
    }

    /// Loads the dashboard at `key`. Missing and undecodable documents both yield a fresh
    /// document for `entity_id`; any other storage error propagates.
    #[instrument(skip(self), fields(operation = "load_or_init"))]
    pub async fn load_or_init(
        &self,
        key: &str,
        entity_id: &str,
    ) -> Result<(DashboardData, DocumentOrigin), IngestError> {
        let body = match self.dashboard_store.get(key).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                info!(entity = entity_id, key, "no dashboard yet, creating");
                return Ok((DashboardData::new(entity_id), DocumentOrigin::Missing));
            }
            Err(e) => return Err(e.into()),
        };

        match self.codec.decode(&body) {
            Ok(mut doc) => {
                if doc.entity_id.is_empty() {
                    doc.entity_id = entity_id.to_string();
                }
                Ok((doc, DocumentOrigin::Stored))
            }
            Err(e) => {
                warn!(
                    entity = entity_id,
                    key,
                    error = %e,
                    "stored dashboard is unreadable; starting from a fresh document"
                );
                Ok((DashboardData::new(entity_id), DocumentOrigin::Corrupt))
            }
        }
    }

    /// Raw export keys for `date`, in file-name order.
    pub async fn day_export_keys(
        &self,
        entity_prefix: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, BlobStoreError> {
        let prefix = paths::day_prefix(entity_prefix, date);
        let mut keys: Vec<String> = self
            .raw_store
            .list(&prefix)
            .await?
            .into_iter()
            .filter(|k| paths::is_raw_export(k))
            .collect();
        paths::sort_by_file_name(&mut keys);
        Ok(keys)
    }

    /// Runs the full update for one entity. `now` is the run timestamp in the job's time zone;
    /// its calendar date is the day being ingested.
    #[instrument(skip(self, now), fields(operation = "process_entity"))]
    pub async fn process_entity(
        &self,
        entity_prefix: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<EntityOutcome, IngestError> {
        let entity_id = paths::entity_id_from_prefix(entity_prefix);
        let dashboard_key = paths::dashboard_key(entity_prefix, &entity_id);
        let today = now.date_naive();

        let (mut doc, origin) = self.load_or_init(&dashboard_key, &entity_id).await?;
        doc.last_update = Some(now);

        let keys = self.day_export_keys(entity_prefix, today).await?;
        let mut outcome = EntityOutcome {
            entity_id: entity_id.clone(),
            dashboard_key: dashboard_key.clone(),
            origin,
            date: today,
            blobs_found: keys.len(),
            day_updated: false,
            data_points: 0,
            rows_skipped: 0,
        };

        let mut staging = None;
        if keys.is_empty() {
            info!(entity = %entity_id, date = %today, "no new data today");
        } else {
            let area = self.stage_exports(&entity_id, &keys).await?;
            let mut bodies = Vec::with_capacity(area.files().len());
            for path in area.files() {
                let body = tokio::fs::read(path)
                    .await
                    .map_err(|source| IngestError::Staging {
                        path: path.clone(),
                        source,
                    })?;
                bodies.push(body);
            }
            match aggregate_day(self.row_reader.as_ref(), bodies.iter().map(Vec::as_slice)) {
                Some(day) => {
                    outcome.day_updated = true;
                    outcome.data_points = day.stats.data_points_count;
                    outcome.rows_skipped = day.rows_skipped;
                    debug!(
                        entity = %entity_id,
                        data_points = day.stats.data_points_count,
                        rows_skipped = day.rows_skipped,
                        "day aggregated"
                    );
                    doc.apply_day(today, day.stats, day.status);
                }
                None => {
                    info!(
                        entity = %entity_id,
                        date = %today,
                        files = keys.len(),
                        "no valid samples today"
                    );
                }
            }
            staging = Some(area);
        }

        refresh_monthly_summaries(&mut doc, today);

        let body = self.codec.encode(&doc)?;
        self.dashboard_store.put(&dashboard_key, body).await?;
        info!(entity = %entity_id, key = %dashboard_key, "dashboard updated");

        if let Some(area) = staging {
            let path = area.path().to_path_buf();
            if let Err(e) = area.close() {
                warn!(path = %path.display(), error = %e, "staging cleanup failed");
            }
        }
        Ok(outcome)
    }

    /// Copies the listed exports into a fresh staging area, preserving order.
    /// Keys removed between list and get are skipped.
    async fn stage_exports(
        &self,
        entity_id: &str,
        keys: &[String],
    ) -> Result<StagingArea, IngestError> {
        let mut area = StagingArea::create(&self.staging_root, entity_id).map_err(|source| {
            IngestError::Staging {
                path: self.staging_root.clone(),
                source,
            }
        })?;
        let dir = area.path().to_path_buf();
        for key in keys {
            let body = match self.raw_store.get(key).await {
                Ok(body) => body,
                Err(e) if e.is_not_found() => {
                    warn!(key = %key, "export vanished before download, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            area.stage(key, &body)
                .await
                .map_err(|source| IngestError::Staging {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(area)
    }
}

/// Recomputes both monthly summaries from the whole history.
pub fn refresh_monthly_summaries(doc: &mut DashboardData, today: NaiveDate) {
    doc.current_month_summary = monthly_summary(&doc.history, today, MonthKind::Current);
    doc.last_month_summary =
        monthly_summary(&doc.history, previous_month(today), MonthKind::Closed);
}
