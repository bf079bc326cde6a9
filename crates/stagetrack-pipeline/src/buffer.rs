//! Buffer shift
//!
//! A view-time transform that moves planned dates by a number of calendar
//! months, per stage according to [`BufferPolicy`]. Actual dates are never
//! touched. The input is not modified; shifted copies are returned.

use stagetrack_core::calendar::add_months;
use stagetrack_core::{AggregatedStageInterval, BufferPolicy, ShiftKind};

/// Shift the planned dates of one interval
pub fn shift_interval(
    interval: &AggregatedStageInterval,
    offset_months: i32,
    policy: &BufferPolicy,
) -> AggregatedStageInterval {
    let mut shifted = interval.clone();
    if offset_months == 0 {
        return shifted;
    }

    let shift = |date: Option<chrono::NaiveDate>| date.map(|d| add_months(d, offset_months));
    match policy.shift_kind(interval.stage) {
        ShiftKind::NoShift => {}
        ShiftKind::StartOnly => {
            shifted.planned_start = shift(interval.planned_start);
        }
        ShiftKind::FullShift => {
            shifted.planned_start = shift(interval.planned_start);
            shifted.planned_end = shift(interval.planned_end);
        }
    }
    shifted
}

/// Apply a buffer of `offset_months` to every interval, classifying stages
/// through `policy`
pub fn apply_buffer(
    intervals: &[AggregatedStageInterval],
    offset_months: i32,
    policy: &BufferPolicy,
) -> Vec<AggregatedStageInterval> {
    intervals
        .iter()
        .map(|interval| shift_interval(interval, offset_months, policy))
        .collect()
}

/// Apply the policy's own offset when it is enabled; otherwise plain copies
pub fn apply_policy(
    intervals: &[AggregatedStageInterval],
    policy: &BufferPolicy,
) -> Vec<AggregatedStageInterval> {
    let offset = if policy.is_active() { policy.months } else { 0 };
    apply_buffer(intervals, offset, policy)
}
