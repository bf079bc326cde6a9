//! Flat export rows, project rollups and the wide pivot
//!
//! The export is one row per visible (project, stage). Rollups are the
//! per-project header rows of the hierarchical report. The pivot has one
//! row per (org unit, project) with a cell per stage.
//!
//! Rows start in display order and can be re-sorted with a
//! [`ReportSort`]; rollups and pivot rows follow the first appearance of
//! each project in the sorted rows.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stagetrack_core::{
    BusinessCalendar, OrgUnitId, ProjectId, StageCatalog, StageCode, StageEvaluation,
    StatusCategory, StatusSummary,
};

use crate::Evaluation;

// ============================================================================
// Export Rows
// ============================================================================

/// One row of the flat export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub project: ProjectId,
    pub org_unit: Option<OrgUnitId>,
    /// Canonical stage code
    pub stage: String,
    pub stage_name: String,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    pub completion_pct: f64,
    /// Termination variance in business days
    pub variance_days: Option<i64>,
    pub duration_variance_days: Option<i64>,
    pub status: StatusCategory,
}

impl From<&StageEvaluation> for ExportRow {
    fn from(entry: &StageEvaluation) -> Self {
        let interval = &entry.interval;
        Self {
            project: interval.project_id.clone(),
            org_unit: interval.org_unit.clone(),
            stage: interval.stage.code().to_string(),
            stage_name: interval.stage.display_name().to_string(),
            planned_start: interval.planned_start,
            planned_end: interval.planned_end,
            actual_start: interval.actual_start,
            actual_end: interval.actual_end,
            completion_pct: interval.completion_pct,
            variance_days: entry.variance.termination_variance_days,
            duration_variance_days: entry.variance.duration_variance_days,
            status: entry.status,
        }
    }
}

/// Export rows in display order
pub fn export_rows(evaluation: &Evaluation) -> Vec<ExportRow> {
    evaluation.entries.iter().map(ExportRow::from).collect()
}

// ============================================================================
// Sorting
// ============================================================================

/// Column the export rows are sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Display order: projects by reference date, stages by catalog order
    #[default]
    Default,
    /// Project name, A-Z
    Project,
    PlannedStart,
    PlannedEnd,
    /// Termination variance in business days (late is positive)
    Variance,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::Project => "project",
            SortKey::PlannedStart => "planned_start",
            SortKey::PlannedEnd => "planned_end",
            SortKey::Variance => "variance",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "default" => Ok(SortKey::Default),
            "project" | "name" => Ok(SortKey::Project),
            "planned_start" | "start" => Ok(SortKey::PlannedStart),
            "planned_end" | "end" => Ok(SortKey::PlannedEnd),
            "variance" => Ok(SortKey::Variance),
            other => Err(format!(
                "unknown sort key '{}' (expected default, project, planned-start, planned-end or variance)",
                other
            )),
        }
    }
}

/// Row ordering of a report.
///
/// The sort is stable, so rows with equal keys keep their display order.
/// Rows without a value for the key sort last in both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSort {
    pub key: SortKey,
    pub descending: bool,
}

impl ReportSort {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    fn direct(&self, ordering: Ordering) -> Ordering {
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }

    /// Compare optional values, keeping missing ones last
    fn compare_opt<T: Ord>(&self, a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.direct(a.cmp(&b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Sort rows in place; `rows` must be in display order
    pub fn apply(&self, rows: &mut [ExportRow]) {
        match self.key {
            SortKey::Default => {
                if self.descending {
                    rows.reverse();
                }
            }
            SortKey::Project => rows.sort_by(|a, b| self.direct(a.project.cmp(&b.project))),
            SortKey::PlannedStart => {
                rows.sort_by(|a, b| self.compare_opt(a.planned_start, b.planned_start))
            }
            SortKey::PlannedEnd => {
                rows.sort_by(|a, b| self.compare_opt(a.planned_end, b.planned_end))
            }
            SortKey::Variance => {
                rows.sort_by(|a, b| self.compare_opt(a.variance_days, b.variance_days))
            }
        }
    }
}

/// Distinct projects in the order they first appear in `rows`
fn project_order(rows: &[ExportRow]) -> Vec<&str> {
    let mut projects: Vec<&str> = Vec::new();
    for row in rows {
        if !projects.contains(&row.project.as_str()) {
            projects.push(row.project.as_str());
        }
    }
    projects
}

// ============================================================================
// Project Rollups
// ============================================================================

/// Header row summarising one project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRollup {
    pub project: ProjectId,
    pub org_unit: Option<OrgUnitId>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    /// Milestone stage variance if known, else the rounded mean of stage variances
    pub variance_days: Option<i64>,
    /// Completion weighted by planned business-day duration
    pub completion_pct: f64,
    pub stage_count: usize,
}

/// Completion of a group of stages, weighted by planned duration.
///
/// Stages without a positive planned duration weigh nothing; when the
/// total weight is zero the plain mean is used instead.
pub fn weighted_completion(entries: &[&StageEvaluation], calendar: &BusinessCalendar) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }

    let (weighted, total) = entries.iter().fold((0.0, 0i64), |(weighted, total), e| {
        let weight = calendar
            .duration(e.interval.planned_start, e.interval.planned_end)
            .filter(|d| *d > 0)
            .unwrap_or(0);
        (
            weighted + e.interval.completion_pct * weight as f64,
            total + weight,
        )
    });

    if total == 0 {
        entries.iter().map(|e| e.interval.completion_pct).sum::<f64>() / entries.len() as f64
    } else {
        weighted / total as f64
    }
}

fn rollup_variance(entries: &[&StageEvaluation], catalog: &StageCatalog) -> Option<i64> {
    let milestone = catalog.milestone();
    if let Some(days) = entries
        .iter()
        .filter(|e| e.interval.stage == milestone)
        .find_map(|e| e.variance.termination_variance_days)
    {
        return Some(days);
    }

    let values: Vec<i64> = entries
        .iter()
        .filter_map(|e| e.variance.termination_variance_days)
        .collect();
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    Some(mean.round() as i64)
}

/// Rollup of one project's visible stages
pub fn project_rollup(
    project: &str,
    entries: &[&StageEvaluation],
    calendar: &BusinessCalendar,
    catalog: &StageCatalog,
) -> ProjectRollup {
    let intervals = || entries.iter().map(|e| &e.interval);
    ProjectRollup {
        project: project.to_string(),
        org_unit: intervals().find_map(|i| i.org_unit.clone()),
        planned_start: intervals().filter_map(|i| i.planned_start).min(),
        planned_end: intervals().filter_map(|i| i.planned_end).max(),
        actual_start: intervals().filter_map(|i| i.actual_start).min(),
        actual_end: intervals().filter_map(|i| i.actual_end).max(),
        variance_days: rollup_variance(entries, catalog),
        completion_pct: weighted_completion(entries, calendar),
        stage_count: entries.len(),
    }
}

/// Rollups of the given projects, in that order
pub fn project_rollups(
    evaluation: &Evaluation,
    projects: &[&str],
    calendar: &BusinessCalendar,
    catalog: &StageCatalog,
) -> Vec<ProjectRollup> {
    projects
        .iter()
        .map(|project| {
            let entries: Vec<&StageEvaluation> = evaluation.project_entries(project).collect();
            project_rollup(project, &entries, calendar, catalog)
        })
        .collect()
}

// ============================================================================
// Pivot
// ============================================================================

/// Dates and variance of one stage in a pivot row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotCell {
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    pub variance_days: Option<i64>,
}

impl From<&StageEvaluation> for PivotCell {
    fn from(entry: &StageEvaluation) -> Self {
        let interval = &entry.interval;
        Self {
            planned_start: interval.planned_start,
            planned_end: interval.planned_end,
            actual_start: interval.actual_start,
            actual_end: interval.actual_end,
            variance_days: entry.variance.termination_variance_days,
        }
    }
}

/// One (org unit, project) line of the wide table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub org_unit: Option<OrgUnitId>,
    pub project: ProjectId,
    /// One cell per entry of [`Pivot::stages`]; `None` when the project
    /// has no visible interval for that stage
    pub cells: Vec<Option<PivotCell>>,
}

/// Wide table: stages as column groups, projects as rows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// Stage columns present in the view, in catalog order
    pub stages: Vec<StageCode>,
    pub rows: Vec<PivotRow>,
}

impl Pivot {
    /// Pivot the visible entries, with rows in the given project order
    pub fn build(evaluation: &Evaluation, projects: &[&str], catalog: &StageCatalog) -> Self {
        let mut stages: Vec<StageCode> = Vec::new();
        for entry in &evaluation.entries {
            if !stages.contains(&entry.interval.stage) {
                stages.push(entry.interval.stage);
            }
        }
        stages.sort_by_key(|stage| catalog.order_index(*stage));

        let rows = projects
            .iter()
            .map(|project| {
                let entries: Vec<&StageEvaluation> =
                    evaluation.project_entries(project).collect();
                PivotRow {
                    org_unit: entries.iter().find_map(|e| e.interval.org_unit.clone()),
                    project: project.to_string(),
                    cells: stages
                        .iter()
                        .map(|stage| {
                            entries
                                .iter()
                                .find(|e| e.interval.stage == *stage)
                                .map(|e| PivotCell::from(*e))
                        })
                        .collect(),
                }
            })
            .collect();

        Self { stages, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Report
// ============================================================================

/// Everything the export collaborator needs for one view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub today: NaiveDate,
    pub sort: ReportSort,
    pub rows: Vec<ExportRow>,
    pub rollups: Vec<ProjectRollup>,
    pub pivot: Pivot,
    pub summary: StatusSummary,
}

impl Report {
    pub fn build(
        evaluation: &Evaluation,
        calendar: &BusinessCalendar,
        catalog: &StageCatalog,
        sort: ReportSort,
    ) -> Self {
        let mut rows = export_rows(evaluation);
        sort.apply(&mut rows);

        let projects = project_order(&rows);
        let rollups = project_rollups(evaluation, &projects, calendar, catalog);
        let pivot = Pivot::build(evaluation, &projects, catalog);

        Self {
            today: evaluation.today,
            sort,
            rollups,
            pivot,
            rows,
            summary: evaluation.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagetrack_core::{AggregatedStageInterval, StageCode, VarianceMetric, ViewMode};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn entry(interval: AggregatedStageInterval, variance: Option<i64>) -> StageEvaluation {
        StageEvaluation {
            interval,
            variance: VarianceMetric {
                termination_variance_days: variance,
                duration_variance_days: None,
            },
            status: StatusCategory::OnTrackInProgress,
        }
    }

    #[test]
    fn weighted_completion_by_planned_duration() {
        // Mon Jan 1 -> Fri Jan 12: 9 business days; Mon Jan 1 -> Wed Jan 3: 2
        let long = entry(
            AggregatedStageInterval::new("A", StageCode::Dm)
                .planned(date(2024, 1, 1), date(2024, 1, 12))
                .completion(100.0),
            None,
        );
        let short = entry(
            AggregatedStageInterval::new("A", StageCode::Doc)
                .planned(date(2024, 1, 1), date(2024, 1, 3))
                .completion(0.0),
            None,
        );
        let pct = weighted_completion(&[&long, &short], &BusinessCalendar::default());
        assert!((pct - 900.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_completion_falls_back_to_mean() {
        let a = entry(AggregatedStageInterval::new("A", StageCode::Dm).completion(100.0), None);
        let b = entry(AggregatedStageInterval::new("A", StageCode::Doc).completion(50.0), None);
        assert_eq!(weighted_completion(&[&a, &b], &BusinessCalendar::default()), 75.0);
        assert_eq!(weighted_completion(&[], &BusinessCalendar::default()), 0.0);
    }

    #[test]
    fn rollup_prefers_milestone_variance() {
        let catalog = StageCatalog::standard();
        let dm = entry(AggregatedStageInterval::new("A", StageCode::Dm), Some(10));
        let ass = entry(AggregatedStageInterval::new("A", StageCode::Ass), Some(-2));
        assert_eq!(rollup_variance(&[&dm, &ass], &catalog), Some(-2));
    }

    #[test]
    fn rollup_variance_mean_rounds() {
        let catalog = StageCatalog::standard();
        let dm = entry(AggregatedStageInterval::new("A", StageCode::Dm), Some(3));
        let doc = entry(AggregatedStageInterval::new("A", StageCode::Doc), Some(4));
        let eng = entry(AggregatedStageInterval::new("A", StageCode::Eng), None);
        assert_eq!(rollup_variance(&[&dm, &doc, &eng], &catalog), Some(4));
        assert_eq!(rollup_variance(&[&eng], &catalog), None);
    }

    #[test]
    fn report_from_evaluation() {
        let evaluation = Evaluation {
            mode: ViewMode::PerProject,
            active_stage: None,
            today: date(2024, 6, 1),
            entries: vec![
                entry(
                    AggregatedStageInterval::new("A", StageCode::Dm)
                        .planned(date(2024, 1, 1), date(2024, 1, 31))
                        .actual(date(2024, 1, 2), date(2024, 2, 5)),
                    Some(4),
                ),
                entry(
                    AggregatedStageInterval::new("A", StageCode::Doc)
                        .planned(date(2024, 2, 1), date(2024, 3, 15)),
                    None,
                ),
                entry(AggregatedStageInterval::new("B", StageCode::Dm), None),
            ],
        };

        let report = Report::build(
            &evaluation,
            &BusinessCalendar::default(),
            &StageCatalog::standard(),
            ReportSort::default(),
        );
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].stage, "DM");
        assert_eq!(report.rows[0].variance_days, Some(4));

        assert_eq!(report.rollups.len(), 2);
        let a = &report.rollups[0];
        assert_eq!(a.project, "A");
        assert_eq!(a.planned_start, Some(date(2024, 1, 1)));
        assert_eq!(a.planned_end, Some(date(2024, 3, 15)));
        assert_eq!(a.actual_end, Some(date(2024, 2, 5)));
        assert_eq!(a.variance_days, Some(4));
        assert_eq!(a.stage_count, 2);
        assert_eq!(report.summary.total(), 3);

        assert_eq!(report.pivot.stages, vec![StageCode::Dm, StageCode::Doc]);
        assert_eq!(report.pivot.rows.len(), 2);
        let b = &report.pivot.rows[1];
        assert_eq!(b.project, "B");
        assert!(b.cells[0].is_some());
        assert!(b.cells[1].is_none());
    }

    fn row(project: &str, planned_end: Option<NaiveDate>, variance: Option<i64>) -> ExportRow {
        ExportRow {
            project: project.to_string(),
            org_unit: None,
            stage: "DM".to_string(),
            stage_name: StageCode::Dm.display_name().to_string(),
            planned_start: None,
            planned_end,
            actual_start: None,
            actual_end: None,
            completion_pct: 0.0,
            variance_days: variance,
            duration_variance_days: None,
            status: StatusCategory::NoData,
        }
    }

    fn names(rows: &[ExportRow]) -> Vec<&str> {
        rows.iter().map(|r| r.project.as_str()).collect()
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!("planned-start".parse::<SortKey>(), Ok(SortKey::PlannedStart));
        assert_eq!("PLANNED_END".parse::<SortKey>(), Ok(SortKey::PlannedEnd));
        assert_eq!("name".parse::<SortKey>(), Ok(SortKey::Project));
        assert!("colour".parse::<SortKey>().is_err());
        assert_eq!(SortKey::PlannedStart.as_str(), "planned_start");
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        let rows = || {
            vec![
                row("A", None, None),
                row("B", Some(date(2024, 3, 1)), Some(5)),
                row("C", Some(date(2024, 1, 1)), Some(-2)),
            ]
        };

        let mut asc = rows();
        ReportSort::new(SortKey::PlannedEnd).apply(&mut asc);
        assert_eq!(names(&asc), vec!["C", "B", "A"]);

        let mut desc = rows();
        ReportSort::new(SortKey::Variance).descending(true).apply(&mut desc);
        assert_eq!(names(&desc), vec!["B", "C", "A"]);
    }

    #[test]
    fn default_sort_keeps_or_reverses_display_order() {
        let rows = || vec![row("Z", None, None), row("A", None, None)];

        let mut kept = rows();
        ReportSort::default().apply(&mut kept);
        assert_eq!(names(&kept), vec!["Z", "A"]);

        let mut reversed = rows();
        ReportSort::default().descending(true).apply(&mut reversed);
        assert_eq!(names(&reversed), vec!["A", "Z"]);
    }

    #[test]
    fn project_sort_is_stable_within_a_project() {
        let mut rows = vec![row("B", None, Some(1)), row("A", None, Some(2)), row("B", None, Some(3))];
        ReportSort::new(SortKey::Project).apply(&mut rows);
        let keyed: Vec<(&str, Option<i64>)> =
            rows.iter().map(|r| (r.project.as_str(), r.variance_days)).collect();
        assert_eq!(keyed, vec![("A", Some(2)), ("B", Some(1)), ("B", Some(3))]);
    }
}
