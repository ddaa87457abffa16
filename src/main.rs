use anyhow::Result;
use garage_dashboard::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let job_config = app_config.job_config()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        raw_root = %app_config.storage.raw_root,
        dashboard_root = %app_config.storage.dashboard_root,
        "starting dashboard ETL"
    );

    let engine = Arc::new(ingestion::IngestionEngine::new(ingestion::IngestionDeps {
        raw_store: Arc::new(blob_store::FsBlobStore::new(&app_config.storage.raw_root)),
        dashboard_store: Arc::new(blob_store::FsBlobStore::new(
            &app_config.storage.dashboard_root,
        )),
        codec: Arc::new(codec::JsonCodec {
            pretty: app_config.storage.pretty_json,
        }),
        row_reader: Arc::new(rows::CsvRowReader),
        staging_root: app_config.staging_root(),
    }));

    let Some(cron_expr) = app_config.schedule.cron.clone() else {
        let status = job::invoke(&engine, &job_config).await.map_err(|e| {
            tracing::error!(error = %e, "run failed");
            e
        })?;
        tracing::info!("{}", status);
        println!("{status}");
        return Ok(());
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let scheduler = tokio::spawn({
        let engine = engine.clone();
        async move { job::run_scheduled(engine, job_config, &cron_expr, shutdown_rx).await }
    });

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    scheduler.await??;

    Ok(())
}
