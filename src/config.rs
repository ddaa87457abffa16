use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::job::JobConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the raw ("trusted") bucket: `<entity>/ano=/mes=/dia=/*.csv`.
    pub raw_root: String,
    /// Root of the dashboard ("client") bucket.
    pub dashboard_root: String,
    /// Scratch directory for staged exports; defaults to the OS temp dir.
    #[serde(default)]
    pub staging_dir: Option<String>,
    /// Pretty-print dashboard JSON.
    #[serde(default)]
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// IANA zone of the garages' local time. Decides which day is "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_max_concurrent_entities")]
    pub max_concurrent_entities: usize,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            max_concurrent_entities: default_max_concurrent_entities(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_timezone() -> String {
    "America/Sao_Paulo".into()
}

fn default_max_concurrent_entities() -> usize {
    1
}

fn default_run_timeout_secs() -> u64 {
    840
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfig {
    /// Cron expression with seconds (e.g. "0 0 * * * *" = hourly), read in `ingestion.timezone`.
    /// When unset the binary runs once and exits.
    #[serde(default)]
    pub cron: Option<String>,
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`); `BUCKET_TRUSTED` / `BUCKET_CLIENT`
    /// override the storage roots.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config: AppConfig = toml::from_str(&s)?;
        if let Ok(raw_root) = std::env::var("BUCKET_TRUSTED") {
            config.storage.raw_root = raw_root;
        }
        if let Ok(dashboard_root) = std::env::var("BUCKET_CLIENT") {
            config.storage.dashboard_root = dashboard_root;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.storage.raw_root.is_empty(),
            "storage.raw_root must be non-empty"
        );
        anyhow::ensure!(
            !self.storage.dashboard_root.is_empty(),
            "storage.dashboard_root must be non-empty"
        );
        if let Some(dir) = &self.storage.staging_dir {
            anyhow::ensure!(!dir.is_empty(), "storage.staging_dir must be non-empty when set");
        }
        self.timezone()?;
        anyhow::ensure!(
            self.ingestion.max_concurrent_entities > 0,
            "ingestion.max_concurrent_entities must be > 0, got {}",
            self.ingestion.max_concurrent_entities
        );
        anyhow::ensure!(
            self.ingestion.run_timeout_secs > 0,
            "ingestion.run_timeout_secs must be > 0, got {}",
            self.ingestion.run_timeout_secs
        );
        if let Some(expr) = &self.schedule.cron {
            anyhow::ensure!(
                <cron::Schedule as std::str::FromStr>::from_str(expr).is_ok(),
                "schedule.cron is not a valid cron expression: {:?}",
                expr
            );
        }
        Ok(())
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.ingestion.timezone.parse::<Tz>().map_err(|e| {
            anyhow::anyhow!(
                "ingestion.timezone is not a known IANA zone: {:?} ({})",
                self.ingestion.timezone,
                e
            )
        })
    }

    pub fn staging_root(&self) -> PathBuf {
        self.storage
            .staging_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn job_config(&self) -> anyhow::Result<JobConfig> {
        Ok(JobConfig {
            max_concurrent_entities: self.ingestion.max_concurrent_entities,
            run_timeout: Duration::from_secs(self.ingestion.run_timeout_secs),
            timezone: self.timezone()?,
        })
    }
}
