use anyhow::{Context, Result};
use dashboard_service::{
    config::AppConfig,
    observability,
    sinks::{PresentationSink, UsageCsvSink, UsageJsonSink},
    store::{CsvReadingLog, ReadingStore},
};
use meter_core::domain::GridStep;
use meter_core::estimator;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let store = CsvReadingLog::open(&cfg.store.path)?;
    let readings = store.snapshot().await?;

    let out_dir = Path::new(&cfg.export.directory);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create export directory {}", out_dir.display()))?;

    for &hours in &cfg.export.interval_hours {
        let step = GridStep::from_hours(hours)
            .with_context(|| format!("invalid export interval {hours}h"))?;

        let series = estimator::estimate(&readings, step);

        let csv_path = out_dir.join(format!("usage_{hours}h.csv"));
        UsageCsvSink::new(&csv_path).present(&series).await?;

        let json_path = out_dir.join(format!("usage_{hours}h.json"));
        UsageJsonSink::new(&json_path).present(&series).await?;

        tracing::info!(
            hours,
            rows = series.len(),
            csv = %csv_path.display(),
            json = %json_path.display(),
            "usage series exported"
        );
    }

    Ok(())
}
