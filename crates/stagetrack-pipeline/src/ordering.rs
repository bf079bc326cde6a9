//! Ordering engine
//!
//! Projects are sorted by a reference date, ascending, ties broken by
//! display name. Within a project, stages follow the catalog order with
//! `Unknown` last.
//!
//! The reference date is the first available of:
//! 1. the milestone stage's planned end
//! 2. the earliest planned start
//! 3. the earliest actual end
//! 4. the earliest actual start
//!
//! A project with none of these sorts after every dated project.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use stagetrack_core::{AggregatedStageInterval, StageCatalog, StageEvaluation};

/// Sort key of a project; `None` sorts after every date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferenceDate(pub Option<NaiveDate>);

impl Ord for ReferenceDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for ReferenceDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reference date of one project from its intervals
pub fn reference_date<'a>(
    intervals: impl IntoIterator<Item = &'a AggregatedStageInterval> + Clone,
    catalog: &StageCatalog,
) -> ReferenceDate {
    let milestone = catalog.milestone();
    let milestone_end = intervals
        .clone()
        .into_iter()
        .filter(|i| i.stage == milestone)
        .filter_map(|i| i.planned_end)
        .min();

    let earliest = |pick: fn(&AggregatedStageInterval) -> Option<NaiveDate>| {
        intervals.clone().into_iter().filter_map(pick).min()
    };

    ReferenceDate(
        milestone_end
            .or_else(|| earliest(|i| i.planned_start))
            .or_else(|| earliest(|i| i.actual_end))
            .or_else(|| earliest(|i| i.actual_start)),
    )
}

/// Reference dates of every project present in `entries`
pub fn project_reference_dates(
    entries: &[StageEvaluation],
    catalog: &StageCatalog,
) -> BTreeMap<String, ReferenceDate> {
    let mut by_project: BTreeMap<&str, Vec<&AggregatedStageInterval>> = BTreeMap::new();
    for entry in entries {
        by_project
            .entry(entry.interval.project_id.as_str())
            .or_default()
            .push(&entry.interval);
    }

    by_project
        .into_iter()
        .map(|(project, intervals)| {
            (
                project.to_string(),
                reference_date(intervals.iter().copied(), catalog),
            )
        })
        .collect()
}

/// Sort evaluated intervals into display order
pub fn order(entries: Vec<StageEvaluation>, catalog: &StageCatalog) -> Vec<StageEvaluation> {
    let references = project_reference_dates(&entries, catalog);
    order_by(entries, &references, catalog)
}

/// Sort evaluated intervals using precomputed project reference dates.
///
/// Projects missing from `references` sort with the undated ones.
pub fn order_by(
    mut entries: Vec<StageEvaluation>,
    references: &BTreeMap<String, ReferenceDate>,
    catalog: &StageCatalog,
) -> Vec<StageEvaluation> {
    let key = |entry: &StageEvaluation| {
        let project = entry.interval.project_id.as_str();
        (
            references
                .get(project)
                .copied()
                .unwrap_or(ReferenceDate(None)),
            catalog.order_index(entry.interval.stage),
        )
    };

    entries.sort_by(|a, b| {
        let (ref_a, stage_a) = key(a);
        let (ref_b, stage_b) = key(b);
        ref_a
            .cmp(&ref_b)
            .then_with(|| a.interval.project_id.cmp(&b.interval.project_id))
            .then_with(|| stage_a.cmp(&stage_b))
    });
    entries
}
