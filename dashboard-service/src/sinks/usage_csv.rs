use std::path::PathBuf;

use meter_core::domain::{timestamp, IntervalUsageRecord};

use super::PresentationSink;
use crate::pipeline::PipelineError;

/// Spreadsheet export of a usage series.
///
/// Columns: `checkpoint,period,estimated_value,interval_usage`. The first
/// emitted row has no usage figure and its cell stays empty.
pub struct UsageCsvSink {
    path: PathBuf,
}

impl UsageCsvSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, series: &[IntervalUsageRecord]) -> Result<(), PipelineError> {
        let mut writer = csv::Writer::from_path(&self.path)
            .map_err(|e| PipelineError::Sink(format!("failed to create usage CSV: {e}")))?;

        writer
            .write_record(["checkpoint", "period", "estimated_value", "interval_usage"])
            .map_err(|e| PipelineError::Sink(format!("failed to write usage CSV header: {e}")))?;

        for record in series {
            let usage = record
                .interval_usage
                .map(|u| u.to_string())
                .unwrap_or_default();
            writer
                .write_record([
                    timestamp::format_timestamp(record.checkpoint),
                    record.period_label.clone(),
                    record.estimated_value.to_string(),
                    usage,
                ])
                .map_err(|e| PipelineError::Sink(format!("failed to write usage CSV row: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush usage CSV: {e}")))?;

        metrics::counter!("usage_rows_exported_total").increment(series.len() as u64);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PresentationSink for UsageCsvSink {
    async fn present(&self, series: &[IntervalUsageRecord]) -> Result<(), PipelineError> {
        self.write(series)
    }
}
