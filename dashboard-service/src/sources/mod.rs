pub mod http_reading;
pub mod reading_backfill_file;
pub mod reading_csv_file;

pub use http_reading::HttpReadingSource;
pub use reading_backfill_file::ReadingBackfillFileSource;
pub use reading_csv_file::ReadingCsvFileSource;
