use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use meter_core::domain::IntervalUsageRecord;
use time::PrimitiveDateTime;

use super::PresentationSink;
use crate::pipeline::PipelineError;
use crate::timefmt;

/// Chart-feed export: the usage series as one JSON array.
pub struct UsageJsonSink {
    path: PathBuf,
}

/// Serialized form of one usage record, shared with the query API so the
/// file export and the HTTP response carry identical rows.
#[derive(Debug, serde::Serialize)]
pub struct UsageRow {
    #[serde(serialize_with = "timefmt::serialize_timestamp")]
    pub checkpoint: PrimitiveDateTime,
    pub period: String,
    pub estimated_value: f64,
    pub usage: Option<f64>,
}

impl From<&IntervalUsageRecord> for UsageRow {
    fn from(record: &IntervalUsageRecord) -> Self {
        Self {
            checkpoint: record.checkpoint,
            period: record.period_label.clone(),
            estimated_value: record.estimated_value,
            usage: record.interval_usage,
        }
    }
}

impl UsageJsonSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl PresentationSink for UsageJsonSink {
    async fn present(&self, series: &[IntervalUsageRecord]) -> Result<(), PipelineError> {
        let rows: Vec<UsageRow> = series.iter().map(UsageRow::from).collect();

        let file = File::create(&self.path)
            .map_err(|e| PipelineError::Sink(format!("failed to create usage JSON: {e}")))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &rows)
            .map_err(|e| PipelineError::Sink(format!("failed to write usage JSON: {e}")))?;
        // Small exports sit entirely in the buffer; only the flush hits the disk.
        writer
            .flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush usage JSON: {e}")))?;

        metrics::counter!("usage_rows_exported_total").increment(series.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn the_export_parses_back_with_a_null_first_usage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");

        let series = vec![
            IntervalUsageRecord {
                checkpoint: datetime!(2025-01-01 12:00),
                estimated_value: 108.0,
                interval_usage: None,
                period_label: "2025-01-01 morning".to_string(),
            },
            IntervalUsageRecord {
                checkpoint: datetime!(2025-01-02 00:00),
                estimated_value: 132.0,
                interval_usage: Some(24.0),
                period_label: "2025-01-01 afternoon".to_string(),
            },
        ];

        UsageJsonSink::new(&path).present(&series).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();

        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["checkpoint"], "2025-01-01 12:00:00");
        assert_eq!(rows[0]["period"], "2025-01-01 morning");
        assert!(rows[0]["usage"].is_null());
        assert_eq!(rows[1]["usage"], 24.0);
        assert_eq!(rows[1]["estimated_value"], 132.0);
    }

    #[tokio::test]
    async fn an_empty_series_exports_as_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");

        UsageJsonSink::new(&path).present(&[]).await.unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn a_full_disk_fails_the_export_instead_of_truncating_it() {
        let series = vec![IntervalUsageRecord {
            checkpoint: datetime!(2025-01-01 12:00),
            estimated_value: 108.0,
            interval_usage: None,
            period_label: "2025-01-01 morning".to_string(),
        }];

        // Every write to /dev/full fails with ENOSPC.
        let err = UsageJsonSink::new("/dev/full").present(&series).await.unwrap_err();
        assert!(matches!(err, PipelineError::Sink(_)));
    }
}
