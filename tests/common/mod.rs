// Shared test helpers: CSV builders, engine harness, fault-injecting store

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, TimeZone};
use garage_dashboard::blob_store::{BlobStore, BlobStoreError, MemoryBlobStore};
use garage_dashboard::codec::{DocumentCodec, JsonCodec};
use garage_dashboard::ingestion::{IngestionDeps, IngestionEngine};
use garage_dashboard::models::DashboardData;
use garage_dashboard::rows::CsvRowReader;
use tempfile::TempDir;

pub const GIB: u64 = 1024 * 1024 * 1024;

pub const HEADER: &str =
    "timestamp,garage,cpu_percent,cpu_freq,ram_percent,disk_total_bytes,disk_percent";

pub fn row(ts: &str, cpu: f64, ram: f64, disk_total: u64, disk_pct: f64) -> String {
    format!("{ts},g1,{cpu},2400,{ram},{disk_total},{disk_pct}")
}

/// Header line followed by `rows`.
pub fn csv(rows: &[String]) -> Vec<u8> {
    let mut out = String::from(HEADER);
    for r in rows {
        out.push('\n');
        out.push_str(r);
    }
    out.push('\n');
    out.into_bytes()
}

/// São Paulo local time (UTC-3).
pub fn local(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .unwrap()
}

pub fn raw_key(entity: &str, year: i32, month: u32, day: u32, file: &str) -> String {
    format!("idGaragem={entity}/ano={year}/mes={month:02}/dia={day:02}/{file}")
}

pub fn dashboard_key(entity: &str) -> String {
    format!("idGaragem={entity}/dashboard_{entity}.json")
}

pub struct Harness {
    pub raw: Arc<MemoryBlobStore>,
    pub dashboards: Arc<dyn BlobStore>,
    pub staging: TempDir,
    pub engine: IngestionEngine,
}

pub fn harness() -> Harness {
    harness_with_dashboards(Arc::new(MemoryBlobStore::new()))
}

pub fn harness_with_dashboards(dashboards: Arc<dyn BlobStore>) -> Harness {
    let raw = Arc::new(MemoryBlobStore::new());
    harness_with_stores(raw, dashboards)
}

pub fn harness_with_stores(raw: Arc<MemoryBlobStore>, dashboards: Arc<dyn BlobStore>) -> Harness {
    let staging = TempDir::new().unwrap();
    let engine = IngestionEngine::new(IngestionDeps {
        raw_store: raw.clone(),
        dashboard_store: dashboards.clone(),
        codec: Arc::new(JsonCodec::default()),
        row_reader: Arc::new(CsvRowReader),
        staging_root: staging.path().to_path_buf(),
    });
    Harness {
        raw,
        dashboards,
        staging,
        engine,
    }
}

impl Harness {
    pub async fn put_raw(&self, key: &str, body: Vec<u8>) {
        self.raw.put(key, Bytes::from(body)).await.unwrap();
    }

    pub async fn dashboard(&self, entity: &str) -> DashboardData {
        let body = self.dashboards.get(&dashboard_key(entity)).await.unwrap();
        JsonCodec::default().decode(&body).unwrap()
    }

    pub async fn store_dashboard(&self, doc: &DashboardData) {
        let body = JsonCodec::default().encode(doc).unwrap();
        self.dashboards
            .put(&dashboard_key(&doc.entity_id), body)
            .await
            .unwrap();
    }

    /// Entries left in the staging root (should be none after any run).
    pub fn staging_leftovers(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }
}

/// Memory store with injectable failures and latency.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryBlobStore,
    /// Puts to keys containing this text fail.
    pub fail_put_containing: Option<String>,
    pub fail_list_prefixes: bool,
    pub list_prefixes_delay: Option<Duration>,
}

#[async_trait]
impl BlobStore for FaultyStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BlobStoreError> {
        self.inner.list(prefix).await
    }

    async fn list_common_prefixes(&self, delimiter: &str) -> Result<Vec<String>, BlobStoreError> {
        if let Some(delay) = self.list_prefixes_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list_prefixes {
            return Err(BlobStoreError::Backend("bucket unreachable".into()));
        }
        self.inner.list_common_prefixes(delimiter).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, body: Bytes) -> Result<(), BlobStoreError> {
        if let Some(needle) = &self.fail_put_containing
            && key.contains(needle.as_str())
        {
            return Err(BlobStoreError::Backend(format!("put rejected for {key}")));
        }
        self.inner.put(key, body).await
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        self.inner.delete(key).await
    }
}
