//! Interval-usage estimation over a sparse cumulative counter.
//!
//! Readings arrive at whatever instants the user bothered to note, often
//! days apart. The estimator lays a fixed grid of checkpoints over the
//! observed span, interpolates the counter at each checkpoint, and takes
//! first differences to turn the cumulative series into per-interval usage.

use std::collections::BTreeMap;

use time::{PrimitiveDateTime, Time};

use crate::domain::timestamp::format_date;
use crate::domain::{GridStep, IntervalUsageRecord, Reading};

/// Estimate interval usage on a fixed grid from irregular cumulative readings.
///
/// Readings may arrive unsorted and may repeat an instant; the value
/// submitted last for an instant wins. The grid runs from the start of the
/// first reading's day to the day boundary at or after the last reading,
/// stepping by `step`. Checkpoints outside the observed span cannot be
/// interpolated and are dropped rather than extrapolated, so the first
/// emitted row carries no usage figure. Fewer than two distinct instants
/// leave nothing to interpolate between and yield an empty series.
///
/// The result is fully determined by the input: same readings, same grid,
/// same series.
pub fn estimate(readings: &[Reading], step: GridStep) -> Vec<IntervalUsageRecord> {
    let series = dedup_latest(readings);
    if series.len() < 2 {
        return Vec::new();
    }

    let first = series[0].0;
    let last = series[series.len() - 1].0;
    let (grid_start, grid_end) = grid_bounds(first, last);

    let mut records = Vec::new();
    let mut previous: Option<f64> = None;
    for checkpoint in checkpoints(grid_start, grid_end, step) {
        let Some(estimated_value) = value_at(&series, checkpoint) else {
            continue;
        };
        let interval_usage = previous.map(|prev| (estimated_value - prev).max(0.0));
        records.push(IntervalUsageRecord {
            checkpoint,
            estimated_value,
            interval_usage,
            period_label: period_label(checkpoint, step),
        });
        previous = Some(estimated_value);
    }
    records
}

/// Collapse duplicate instants, keeping the value submitted last, and return
/// the series sorted ascending by instant.
fn dedup_latest(readings: &[Reading]) -> Vec<(PrimitiveDateTime, f64)> {
    let mut by_instant: BTreeMap<PrimitiveDateTime, f64> = BTreeMap::new();
    for reading in readings {
        by_instant.insert(reading.taken_at, reading.value);
    }
    by_instant.into_iter().collect()
}

/// Day-aligned bounds: floor of the first instant, ceiling of the last.
/// A last reading exactly at midnight is its own ceiling.
fn grid_bounds(
    first: PrimitiveDateTime,
    last: PrimitiveDateTime,
) -> (PrimitiveDateTime, PrimitiveDateTime) {
    let start = first.date().midnight();
    let end = if last.time() == Time::MIDNIGHT {
        last
    } else {
        match last.date().next_day() {
            Some(day) => day.midnight(),
            // At the calendar's edge there is no next midnight; checkpoints
            // past the last reading are dropped anyway.
            None => last,
        }
    };
    (start, end)
}

fn checkpoints(
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
    step: GridStep,
) -> Vec<PrimitiveDateTime> {
    let mut points = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        points.push(cursor);
        match cursor.checked_add(step.duration()) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    points
}

/// Cumulative value at `at`, weighted by elapsed time between the bracketing
/// readings. `None` outside the observed span: the counter before the first
/// reading and after the last is simply unknown.
fn value_at(series: &[(PrimitiveDateTime, f64)], at: PrimitiveDateTime) -> Option<f64> {
    let (first, _) = *series.first()?;
    let (last, _) = *series.last()?;
    if at < first || at > last {
        return None;
    }

    let idx = series.partition_point(|(instant, _)| *instant <= at);
    let (t0, v0) = series[idx - 1];
    if t0 == at {
        return Some(v0);
    }
    let (t1, v1) = series[idx];

    let span = (t1 - t0).as_seconds_f64();
    let elapsed = (at - t0).as_seconds_f64();
    Some(v0 + (v1 - v0) * elapsed / span)
}

/// Label the interval a checkpoint closes, naming the interval's start.
/// Half-day grids read naturally as morning and afternoon; full-day grids
/// as the date alone; anything else spells out the clock time.
fn period_label(checkpoint: PrimitiveDateTime, step: GridStep) -> String {
    let start = checkpoint - step.duration();
    match step.hours() {
        24 => format_date(start.date()),
        12 if start.hour() < 12 => format!("{} morning", format_date(start.date())),
        12 => format!("{} afternoon", format_date(start.date())),
        _ => format!(
            "{} {:02}:{:02}",
            format_date(start.date()),
            start.hour(),
            start.minute()
        ),
    }
}
