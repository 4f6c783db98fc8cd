use crate::pipeline::{PipelineError, Submission, Transform};
use meter_core::domain::Reading;
use time::macros::datetime;

/// Pure validation of a submitted `Reading`.
///
/// Rules:
/// - value must be a finite, non-negative number.
/// - taken_at must be within a broad sanity window [2000-01-01, 2100-01-01].
pub fn validate_reading(sub: Submission<Reading>) -> Result<Submission<Reading>, PipelineError> {
    let r = &sub.payload;

    if !r.value.is_finite() {
        return Err(PipelineError::Transform("value must be a finite number".to_string()));
    }
    if r.value < 0.0 {
        return Err(PipelineError::Transform("value must be non-negative".to_string()));
    }

    let min_ts = datetime!(2000-01-01 00:00);
    let max_ts = datetime!(2100-01-01 00:00);

    if r.taken_at < min_ts || r.taken_at > max_ts {
        return Err(PipelineError::Transform("timestamp out of allowed range".to_string()));
    }

    Ok(sub)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<Reading, Reading> for ReadingValidation {
    async fn apply(&self, input: Submission<Reading>) -> Result<Submission<Reading>, PipelineError> {
        match validate_reading(input) {
            Ok(sub) => Ok(sub),
            Err(e) => {
                metrics::counter!("reading_validation_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
