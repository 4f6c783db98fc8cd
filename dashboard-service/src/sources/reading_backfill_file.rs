use std::path::PathBuf;

use async_stream::try_stream;
use futures::Stream;
use meter_core::domain::Reading;
use time::PrimitiveDateTime;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use crate::pipeline::{PipelineError, Source, Submission};
use crate::timefmt;

/// NDJSON backfill source for readings.
///
/// Each line in the file is expected to be a JSON object with the same shape
/// as the HTTP submission payload (taken_at, value, optional note). Blank
/// lines are skipped.
pub struct ReadingBackfillFileSource {
    path: PathBuf,
}

#[derive(serde::Deserialize)]
struct BackfillReading {
    #[serde(deserialize_with = "timefmt::deserialize_timestamp")]
    taken_at: PrimitiveDateTime,
    value: f64,
    #[serde(default)]
    note: Option<String>,
}

impl From<BackfillReading> for Reading {
    fn from(i: BackfillReading) -> Self {
        Reading {
            taken_at: i.taken_at,
            value: i.value,
            note: i.note,
        }
    }
}

impl ReadingBackfillFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source<Reading> for ReadingBackfillFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Submission<Reading>, PipelineError>> + Send>>
    {
        let path = self.path.clone();
        let s = try_stream! {
            let file = File::open(&path).await.map_err(|e| {
                PipelineError::Source(format!("failed to open backfill file: {e}"))
            })?;
            let reader = BufReader::new(file);
            let mut lines = reader.lines();

            while let Some(line) = lines.next_line().await.map_err(|e| {
                PipelineError::Source(format!("failed to read backfill line: {e}"))
            })? {
                if line.trim().is_empty() {
                    continue;
                }
                let parsed: BackfillReading = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        metrics::counter!("backfill_parse_errors_total").increment(1);
                        Err(PipelineError::Source(format!(
                            "failed to parse backfill json line: {e}"
                        )))?
                    }
                };
                let reading: Reading = parsed.into();
                yield Submission::now(reading);
            }
        };

        Box::pin(s)
    }
}
