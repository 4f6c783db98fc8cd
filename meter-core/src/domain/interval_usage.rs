use time::PrimitiveDateTime;

/// One point of an estimated usage series.
///
/// `estimated_value` is the interpolated cumulative counter at `checkpoint`.
/// `interval_usage` is the consumption since the previous emitted checkpoint;
/// it is `None` on the first emitted row and clamped to zero when a
/// data-entry mistake makes the raw difference negative. `period_label`
/// names the start of the interval the checkpoint closes.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalUsageRecord {
    pub checkpoint: PrimitiveDateTime,
    pub estimated_value: f64,
    pub interval_usage: Option<f64>,
    pub period_label: String,
}
