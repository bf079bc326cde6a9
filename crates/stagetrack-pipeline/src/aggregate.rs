//! Record aggregation
//!
//! Folds raw records into one [`AggregatedStageInterval`] per
//! (project, canonical stage):
//!
//! - planned/actual start: earliest non-null value
//! - planned/actual end: latest non-null value
//! - completion: plain mean of the valid normalized values, 0 when none
//! - org unit: first non-null value in record order

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use stagetrack_core::{
    normalize_completion, AggregatedStageInterval, OrgUnitId, RawStageRecord, StageCatalog,
    StageCode,
};

#[derive(Default)]
struct Accumulator {
    org_unit: Option<OrgUnitId>,
    planned_start: Option<NaiveDate>,
    planned_end: Option<NaiveDate>,
    actual_start: Option<NaiveDate>,
    actual_end: Option<NaiveDate>,
    completion_sum: f64,
    completion_count: usize,
    record_count: usize,
}

fn earliest(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

impl Accumulator {
    fn add(&mut self, record: &RawStageRecord) {
        if self.org_unit.is_none() {
            self.org_unit.clone_from(&record.org_unit);
        }
        self.planned_start = earliest(self.planned_start, record.planned_start);
        self.planned_end = latest(self.planned_end, record.planned_end);
        self.actual_start = earliest(self.actual_start, record.actual_start);
        self.actual_end = latest(self.actual_end, record.actual_end);

        if let Some(pct) = record.completion.and_then(normalize_completion) {
            self.completion_sum += pct;
            self.completion_count += 1;
        }
        self.record_count += 1;
    }

    fn finish(self, project_id: String, stage: StageCode) -> AggregatedStageInterval {
        let completion_pct = if self.completion_count == 0 {
            0.0
        } else {
            self.completion_sum / self.completion_count as f64
        };

        AggregatedStageInterval {
            project_id,
            org_unit: self.org_unit,
            stage,
            planned_start: self.planned_start,
            planned_end: self.planned_end,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            completion_pct,
            record_count: self.record_count,
        }
    }
}

/// Aggregate raw records by (project, canonical stage).
///
/// Output is sorted by project id, then by stage in canonical order with
/// `Unknown` last, so the same record set always yields the same result.
pub fn aggregate(records: &[RawStageRecord], catalog: &StageCatalog) -> Vec<AggregatedStageInterval> {
    let mut groups: BTreeMap<(String, usize, StageCode), Accumulator> = BTreeMap::new();
    let mut unmapped: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        let stage = catalog.canonicalize(record.stage_label.as_deref());
        if stage.is_unknown() {
            unmapped.insert(record.stage_label.as_deref().unwrap_or(""));
        }
        groups
            .entry((record.project_id.clone(), catalog.order_index(stage), stage))
            .or_default()
            .add(record);
    }

    for label in unmapped {
        warn!(label, "unmapped stage label kept as UNKNOWN");
    }

    let intervals: Vec<_> = groups
        .into_iter()
        .map(|((project_id, _, stage), acc)| acc.finish(project_id, stage))
        .collect();

    debug!(
        records = records.len(),
        intervals = intervals.len(),
        "aggregated records"
    );
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn merges_same_project_and_stage() {
        let records = vec![
            RawStageRecord::new("Alpha", "DM")
                .planned(date(2024, 1, 1), date(2024, 1, 31))
                .completion(50.0),
            RawStageRecord::new("Alpha", "Planejamento")
                .planned(date(2024, 1, 20), date(2024, 2, 28))
                .completion(80.0),
        ];

        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals.len(), 1);

        let dm = &intervals[0];
        assert_eq!(dm.stage, StageCode::Dm);
        assert_eq!(dm.planned_start, Some(date(2024, 1, 1)));
        assert_eq!(dm.planned_end, Some(date(2024, 2, 28)));
        assert_eq!(dm.completion_pct, 65.0);
        assert_eq!(dm.record_count, 2);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            RawStageRecord::new("Beta", "DOC").completion(0.4),
            RawStageRecord::new("Alpha", "ASS").planned(date(2024, 5, 1), date(2024, 5, 2)),
            RawStageRecord::new("Alpha", "DM").started(date(2024, 1, 3)),
            RawStageRecord::new("Alpha", "???"),
        ];
        let catalog = StageCatalog::standard();
        assert_eq!(aggregate(&records, &catalog), aggregate(&records, &catalog));
    }

    #[test]
    fn output_order_is_project_then_stage() {
        let records = vec![
            RawStageRecord::new("Beta", "DM"),
            RawStageRecord::new("Alpha", "mystery"),
            RawStageRecord::new("Alpha", "ASS"),
            RawStageRecord::new("Alpha", "DOC"),
        ];
        let intervals = aggregate(&records, &StageCatalog::standard());
        let keys: Vec<_> = intervals
            .iter()
            .map(|i| (i.project_id.as_str(), i.stage))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Alpha", StageCode::Doc),
                ("Alpha", StageCode::Ass),
                ("Alpha", StageCode::Unknown),
                ("Beta", StageCode::Dm),
            ]
        );
    }

    #[test]
    fn unknown_labels_share_one_interval() {
        let records = vec![
            RawStageRecord::new("Alpha", "foo"),
            RawStageRecord::new("Alpha", "bar"),
        ];
        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].stage, StageCode::Unknown);
        assert_eq!(intervals[0].record_count, 2);
    }

    #[test]
    fn mixed_completion_scales() {
        let records = vec![
            RawStageRecord::new("Alpha", "DM").completion(0.5),
            RawStageRecord::new("Alpha", "DM").completion(90.0),
            RawStageRecord::new("Alpha", "DM").completion(250.0),
            RawStageRecord::new("Alpha", "DM"),
        ];
        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals[0].completion_pct, 70.0);
    }

    #[test]
    fn no_valid_completion_is_zero() {
        let records = vec![RawStageRecord::new("Alpha", "DM").completion(-3.0)];
        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals[0].completion_pct, 0.0);
    }

    #[test]
    fn first_non_null_org_unit_wins() {
        let records = vec![
            RawStageRecord::new("Alpha", "DM"),
            RawStageRecord::new("Alpha", "DM").org_unit("UGB2"),
            RawStageRecord::new("Alpha", "DM").org_unit("UGB1"),
        ];
        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals[0].org_unit.as_deref(), Some("UGB2"));
    }

    #[test]
    fn actual_dates_use_min_start_and_max_end() {
        let records = vec![
            RawStageRecord::new("Alpha", "ENG").actual(date(2024, 3, 5), date(2024, 3, 20)),
            RawStageRecord::new("Alpha", "ENG").started(date(2024, 3, 1)),
            RawStageRecord::new("Alpha", "ENG").actual(date(2024, 3, 10), date(2024, 4, 2)),
        ];
        let intervals = aggregate(&records, &StageCatalog::standard());
        assert_eq!(intervals[0].actual_start, Some(date(2024, 3, 1)));
        assert_eq!(intervals[0].actual_end, Some(date(2024, 4, 2)));
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(&[], &StageCatalog::standard()).is_empty());
    }
}
