pub mod grid;
pub mod interval_usage;
pub mod reading;
pub mod timestamp;

pub use grid::{GridStep, GridStepError};
pub use interval_usage::IntervalUsageRecord;
pub use reading::Reading;
