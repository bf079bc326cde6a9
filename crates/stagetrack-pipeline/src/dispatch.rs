//! View dispatcher
//!
//! One pipeline for both view modes. Every call recomputes from the raw
//! records:
//!
//! 1. org-unit filter, then project filter (on records)
//! 2. aggregation by (project, stage)
//! 3. variance and status, on the unshifted intervals
//! 4. buffer shift of the display copy
//! 5. stage filter (consolidated mode only)
//! 6. project reference dates
//! 7. completion filter
//! 8. ordering by the reference dates of step 6
//!
//! Reference dates are taken before the completion filter, so hiding
//! finished stages never moves a project.
//!
//! When the buffer policy asks for `recompute_metrics`, step 3 runs on the
//! shifted copy instead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use stagetrack_core::status::classify;
use stagetrack_core::{
    AggregatedStageInterval, BusinessCalendar, RawStageRecord, StageCatalog, StageCode,
    StageEvaluation, StatusSummary, ViewMode, ViewState,
};

use crate::{aggregate, buffer, ordering};

/// Result of one evaluation, in display order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mode: ViewMode,
    pub active_stage: Option<StageCode>,
    /// Reference date used for status classification
    pub today: NaiveDate,
    pub entries: Vec<StageEvaluation>,
}

impl Evaluation {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct projects in display order
    pub fn projects(&self) -> Vec<&str> {
        let mut projects: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let id = entry.interval.project_id.as_str();
            if !projects.contains(&id) {
                projects.push(id);
            }
        }
        projects
    }

    /// Entries of one project, in display order
    pub fn project_entries<'a>(
        &'a self,
        project_id: &'a str,
    ) -> impl Iterator<Item = &'a StageEvaluation> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.interval.project_id == project_id)
    }

    /// Status counts over the visible entries
    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_statuses(self.entries.iter().map(|e| e.status))
    }
}

/// Runs the record-to-evaluation pipeline with fixed lookup tables
#[derive(Clone, Debug, Default)]
pub struct ViewDispatcher {
    catalog: StageCatalog,
    calendar: BusinessCalendar,
}

impl ViewDispatcher {
    pub fn new(catalog: StageCatalog, calendar: BusinessCalendar) -> Self {
        Self { catalog, calendar }
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Variance and status of one interval
    pub fn evaluate_interval(
        &self,
        interval: AggregatedStageInterval,
        metrics_source: &AggregatedStageInterval,
        today: NaiveDate,
    ) -> StageEvaluation {
        StageEvaluation {
            variance: self.calendar.variance(metrics_source),
            status: classify(
                metrics_source.completion_pct,
                metrics_source.planned_end,
                metrics_source.actual_end,
                today,
            ),
            interval,
        }
    }

    /// Evaluate the records under a view state
    pub fn evaluate(
        &self,
        records: &[RawStageRecord],
        view: &ViewState,
        today: NaiveDate,
    ) -> Evaluation {
        let filters = &view.filters;
        let selected: Vec<RawStageRecord> = records
            .iter()
            .filter(|r| filters.matches_org_unit(r.org_unit.as_deref()))
            .filter(|r| filters.matches_project(&r.project_id))
            .cloned()
            .collect();
        debug!(
            total = records.len(),
            selected = selected.len(),
            "filtered records"
        );

        let intervals = aggregate::aggregate(&selected, &self.catalog);
        let shifted = buffer::apply_policy(&intervals, &view.buffer);
        let recompute = view.buffer.recompute_metrics && view.buffer.is_active();

        let mut entries: Vec<StageEvaluation> = intervals
            .iter()
            .zip(shifted)
            .map(|(original, display)| {
                if recompute {
                    let source = display.clone();
                    self.evaluate_interval(display, &source, today)
                } else {
                    self.evaluate_interval(display, original, today)
                }
            })
            .collect();

        if let Some(stage) = view.active_stage {
            entries.retain(|e| e.interval.stage == stage);
        }
        let references = ordering::project_reference_dates(&entries, &self.catalog);
        if filters.hide_complete {
            entries.retain(|e| !e.interval.is_complete());
        }
        debug!(entries = entries.len(), mode = ?view.mode(), "visible intervals");

        Evaluation {
            mode: view.mode(),
            active_stage: view.active_stage,
            today,
            entries: ordering::order_by(entries, &references, &self.catalog),
        }
    }
}
