use meter_core::domain::IntervalUsageRecord;

use crate::pipeline::PipelineError;

pub mod usage_csv;
pub mod usage_json;

pub use usage_csv::UsageCsvSink;
pub use usage_json::UsageJsonSink;

/// Anything that can take a computed usage series and render or export it.
#[async_trait::async_trait]
pub trait PresentationSink: Send + Sync {
    async fn present(&self, series: &[IntervalUsageRecord]) -> Result<(), PipelineError>;
}
