use time::PrimitiveDateTime;

/// A cumulative meter reading as the user entered it.
///
/// `taken_at` is wall-clock local time with no zone attached, which is all
/// the entry form ever records. The counter in `value` only ever goes up on
/// a real meter; a lower value at a later instant is a data-entry mistake
/// that downstream estimation has to tolerate.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub taken_at: PrimitiveDateTime,
    pub value: f64,
    pub note: Option<String>,
}
