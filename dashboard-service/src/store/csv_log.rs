use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use meter_core::domain::{timestamp, Reading};
use tokio::sync::Mutex;

use super::{AppendOutcome, ReadingStore, StoreError};

/// Append-only CSV reading log.
///
/// Columns: `taken_at,value,note,entry_id`. The `entry_id` fingerprints the
/// row content so a replayed backfill cannot duplicate entries; the set of
/// known ids is loaded once on open and kept in memory. All file access is
/// serialized behind one async lock, which also pins the arrival order that
/// duplicate-instant resolution depends on.
pub struct CsvReadingLog {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct LogRow {
    taken_at: String,
    value: f64,
    note: Option<String>,
    entry_id: String,
}

/// Content hash of a reading. Strings are length-prefixed so adjacent
/// fields cannot run together.
fn entry_id(reading: &Reading) -> String {
    let mut hasher = blake3::Hasher::new();

    let ts = timestamp::format_timestamp(reading.taken_at);
    hasher.update(&(ts.len() as u32).to_le_bytes());
    hasher.update(ts.as_bytes());

    hasher.update(&reading.value.to_bits().to_le_bytes());

    match &reading.note {
        Some(note) => {
            hasher.update(&[1]);
            hasher.update(&(note.len() as u32).to_le_bytes());
            hasher.update(note.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.finalize().to_hex().to_string()
}

impl CsvReadingLog {
    /// Open the log at `path`, creating it (and any parent directory) when
    /// missing, and load the known entry ids.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // A crash can leave the file created but empty; missing and
        // zero-length files both still need the header.
        let is_empty = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
        if is_empty {
            let file = File::create(&path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(["taken_at", "value", "note", "entry_id"])?;
            writer.flush()?;
        }

        let mut seen = HashSet::new();
        let mut rows = 0usize;
        let mut reader = csv::Reader::from_path(&path)?;
        for result in reader.deserialize::<LogRow>() {
            let row = result?;
            seen.insert(row.entry_id);
            rows += 1;
        }

        tracing::info!(path = %path.display(), rows, "reading log opened");

        Ok(Self {
            path,
            seen: Mutex::new(seen),
        })
    }

    fn append_row(&self, row: &LogRow) -> Result<(), StoreError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    fn parse_row(row: LogRow, line: usize) -> Result<Reading, StoreError> {
        let taken_at =
            timestamp::parse_timestamp(&row.taken_at).map_err(|e| StoreError::Malformed {
                line,
                message: format!("invalid taken_at '{}': {e}", row.taken_at),
            })?;
        Ok(Reading {
            taken_at,
            value: row.value,
            note: row.note,
        })
    }
}

#[async_trait::async_trait]
impl ReadingStore for CsvReadingLog {
    async fn append(&self, reading: &Reading) -> Result<AppendOutcome, StoreError> {
        let id = entry_id(reading);
        let mut seen = self.seen.lock().await;
        if seen.contains(&id) {
            return Ok(AppendOutcome::Duplicate);
        }

        let row = LogRow {
            taken_at: timestamp::format_timestamp(reading.taken_at),
            value: reading.value,
            note: reading.note.clone(),
            entry_id: id.clone(),
        };
        self.append_row(&row)?;
        seen.insert(id);
        Ok(AppendOutcome::Recorded)
    }

    async fn snapshot(&self) -> Result<Vec<Reading>, StoreError> {
        // Blocking file read under the lock; one meter's log stays small.
        let _guard = self.seen.lock().await;
        let mut readings = Vec::new();
        let mut reader = csv::Reader::from_path(&self.path)?;
        for (idx, result) in reader.deserialize::<LogRow>().enumerate() {
            let row = result?;
            // The header occupies line 1.
            readings.push(Self::parse_row(row, idx + 2)?);
        }
        Ok(readings)
    }
}
