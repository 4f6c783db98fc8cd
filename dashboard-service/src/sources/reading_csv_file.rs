use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use futures::Stream;
use meter_core::domain::{timestamp, Reading};

use crate::pipeline::{PipelineError, Source, Submission};

/// CSV backfill source for readings exported from a spreadsheet.
///
/// Expected header columns (by name):
/// - taken_at (`2025-01-01 08:00:00` form)
/// - value
/// - note (optional)
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn record_to_reading(record: &StringRecord, headers: &StringRecord) -> Result<Reading, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let ts_str = get("taken_at")?;
    let taken_at = timestamp::parse_timestamp(ts_str)
        .map_err(|e| PipelineError::Source(format!("invalid taken_at '{ts_str}': {e}")))?;

    let value_str = get("value")?;
    let value: f64 = value_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid value '{value_str}': {e}")))?;

    let note = get("note").ok().and_then(parse_optional_string);

    Ok(Reading {
        taken_at,
        value,
        note,
    })
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingCsvFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Submission<Reading>, PipelineError>> + Send>>
    {
        // This source uses a blocking CSV reader but is wrapped in a single async task.
        // For large files, you might want to move this onto a dedicated thread pool.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
            let mut rdr = csv::Reader::from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                .clone();

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;

                let reading = match record_to_reading(&record, &headers) {
                    Ok(r) => r,
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                yield Submission::now(reading);
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use time::macros::datetime;

    #[tokio::test]
    async fn rows_parse_by_header_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(
            &path,
            "taken_at,value,note\n2025-01-01 08:00:00,100.0,app\n2025-01-02 08:00:00,148.0,\n",
        )
        .unwrap();

        let source = ReadingCsvFileSource::new(&path);
        let items: Vec<_> = source.stream().await.collect().await;

        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().unwrap();
        assert_eq!(first.payload.taken_at, datetime!(2025-01-01 08:00));
        assert_eq!(first.payload.value, 100.0);
        assert_eq!(first.payload.note.as_deref(), Some("app"));
        assert_eq!(items[1].as_ref().unwrap().payload.note, None);
    }

    #[tokio::test]
    async fn columns_may_appear_in_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "value,taken_at\n100.0,2025-01-01 08:00:00\n").unwrap();

        let source = ReadingCsvFileSource::new(&path);
        let items: Vec<_> = source.stream().await.collect().await;

        let only = items[0].as_ref().unwrap();
        assert_eq!(only.payload.value, 100.0);
        assert_eq!(only.payload.note, None);
    }

    #[tokio::test]
    async fn a_missing_value_column_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "taken_at,reading\n2025-01-01 08:00:00,100.0\n").unwrap();

        let source = ReadingCsvFileSource::new(&path);
        let items: Vec<_> = source.stream().await.collect().await;

        assert!(matches!(items[0], Err(PipelineError::Source(_))));
    }
}
