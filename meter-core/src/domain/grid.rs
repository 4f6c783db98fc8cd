use time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridStepError {
    #[error("grid step must cover at least one hour")]
    Zero,
}

/// Spacing of the estimation grid, in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridStep {
    hours: u32,
}

impl GridStep {
    /// Checkpoints at 00:00 and 12:00 of every day.
    pub const HALF_DAY: GridStep = GridStep { hours: 12 };
    /// Checkpoints at 00:00 of every day.
    pub const FULL_DAY: GridStep = GridStep { hours: 24 };

    pub fn from_hours(hours: u32) -> Result<GridStep, GridStepError> {
        if hours == 0 {
            return Err(GridStepError::Zero);
        }
        Ok(GridStep { hours })
    }

    pub fn hours(self) -> u32 {
        self.hours
    }

    pub fn duration(self) -> Duration {
        Duration::hours(i64::from(self.hours))
    }
}
