use anyhow::Result;
use dashboard_service::{
    api::{self, ApiState},
    config::AppConfig,
    metrics_server, observability,
    pipeline::Pipeline,
    sources::HttpReadingSource,
    store::{CsvReadingLog, StoreSink},
    transform,
};
use meter_core::domain::Reading;
use std::{sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // Open the reading log shared by ingestion and the query API
    let store = Arc::new(CsvReadingLog::open(&cfg.store.path)?);

    // Query API
    api::init(
        &cfg.api.bind_addr,
        ApiState {
            store: store.clone(),
            default_interval_hours: cfg.api.default_interval_hours,
        },
    )?;

    // Submission pipeline
    let source = HttpReadingSource::new(&cfg.ingest.bind_addr, cfg.ingest.channel_capacity).await?;
    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::ReadingValidation::default())],
        sink: StoreSink::new(
            store,
            cfg.store.max_retries,
            Duration::from_millis(cfg.store.retry_backoff_ms),
        ),
    };

    pipeline.run().await?;

    Ok(())
}
