pub mod domain;
pub mod estimator;

pub use domain::{GridStep, GridStepError, IntervalUsageRecord, Reading};
pub use estimator::estimate;
