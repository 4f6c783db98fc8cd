use anyhow::{bail, Result};
use dashboard_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sources::ReadingBackfillFileSource,
    store::{CsvReadingLog, StoreSink},
    transform,
};
use meter_core::domain::Reading;
use std::{env, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: backfill_readings <ndjson_file_path>");
    }
    let file_path = &args[1];

    // Load configuration (can point DASHBOARD_CONFIG to a backfill-specific file).
    let cfg = AppConfig::load()?;

    let store = Arc::new(CsvReadingLog::open(&cfg.store.path)?);

    let sink = StoreSink::new(
        store,
        cfg.store.max_retries,
        Duration::from_millis(cfg.store.retry_backoff_ms),
    );

    let source = ReadingBackfillFileSource::new(file_path);

    let pipeline: Pipeline<_, Reading, _> = Pipeline {
        source,
        transforms: vec![Arc::new(transform::ReadingValidation::default())],
        sink,
    };

    pipeline.run().await?;

    tracing::info!(file = %file_path, "backfill complete");

    Ok(())
}
