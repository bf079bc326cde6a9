//! Timeline layout engine
//!
//! Turns ordered stage evaluations into lanes of positioned bars.
//!
//! Horizontal positions are calendar-month based: every month has the same
//! width regardless of its length, and a date sits at
//! `(whole_months(chart_start, date) + (day - 1) / days_in_month) * month_width`.
//! Bars cover whole days, so a bar ends at the position of the day after
//! its last day.
//!
//! The chart starts `lead_months` before the first month with data and
//! ends `trail_months` after the last month shown, where the last month
//! is the later of the data's last date and "today" (capped at
//! `max_trail_months` past the data).

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stagetrack_core::calendar::{add_months, month_floor, month_fraction, whole_months_between};
use stagetrack_core::{
    AggregatedStageInterval, Bar, BarKind, Lane, MarkerSource, MilestoneMarker, OverlapRegion,
    StageCatalog, StageEvaluation, StatusCategory, Timeline, ViewMode, ViewState,
};

// ============================================================================
// Configuration
// ============================================================================

/// Layout parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Position units per calendar month
    pub month_width: f64,
    /// Empty months before the first date
    pub lead_months: u32,
    /// Empty months after the last month shown
    pub trail_months: u32,
    /// How far past the data "today" may stretch the chart
    pub max_trail_months: u32,
    /// Narrowest bar drawn, in position units
    pub min_bar_width: f64,
    /// Extra vertical space between project groups, in lane units
    pub project_gap: f64,
    /// Draw estimated planned bars when planned dates are missing
    pub planned_fallback: bool,
    /// Length of a fallback planned bar with no end date
    pub fallback_days: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            month_width: 30.0,
            lead_months: 1,
            trail_months: 1,
            max_trail_months: 36,
            min_bar_width: 1.0,
            project_gap: 0.75,
            planned_fallback: true,
            fallback_days: 30,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn month_width(mut self, width: f64) -> Self {
        self.month_width = width;
        self
    }

    pub fn min_bar_width(mut self, width: f64) -> Self {
        self.min_bar_width = width;
        self
    }

    pub fn project_gap(mut self, gap: f64) -> Self {
        self.project_gap = gap;
        self
    }

    /// Leave lanes without planned dates without a planned bar
    pub fn no_planned_fallback(mut self) -> Self {
        self.planned_fallback = false;
        self
    }
}

// ============================================================================
// Spans
// ============================================================================

/// Inclusive date range covered by a bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Span {
    /// Build a span; an end before the start collapses to the start
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Common days of two spans
    pub fn intersect(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Span { start, end })
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Shift a date by whole days, saturating at the calendar limits
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let delta = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(delta).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(delta).unwrap_or(NaiveDate::MIN)
    }
}

/// Position of a date relative to the chart start
pub fn position(chart_start: NaiveDate, date: NaiveDate, month_width: f64) -> f64 {
    (whole_months_between(chart_start, date) as f64 + month_fraction(date)) * month_width
}

/// Bar that draws on top when planned and actual overlap: the shorter one
/// when one range contains the other, otherwise the actual bar
pub fn top_bar(planned: &Span, actual: &Span) -> BarKind {
    if actual.contains(planned) && !planned.contains(actual) {
        BarKind::Planned
    } else {
        BarKind::Actual
    }
}

/// Spans of one lane with their display flags
#[derive(Clone, Copy, Debug, Default)]
struct LaneSpans {
    /// Planned span, and whether it was estimated
    planned: Option<(Span, bool)>,
    /// Actual span, and whether it was extended to today
    actual: Option<(Span, bool)>,
}

// ============================================================================
// Engine
// ============================================================================

/// Computes a [`Timeline`] from evaluated intervals
#[derive(Clone, Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Planned span of an interval.
    ///
    /// With both planned dates known this is exact. Otherwise, when the
    /// fallback is enabled and the interval has any date at all, missing
    /// ends are filled from the actual dates, then from today and
    /// `fallback_days`; the span is then flagged as estimated.
    pub fn planned_span(
        &self,
        interval: &AggregatedStageInterval,
        today: NaiveDate,
    ) -> Option<(Span, bool)> {
        match (interval.planned_start, interval.planned_end) {
            (Some(start), Some(end)) => Some((Span::new(start, end), false)),
            _ if !self.config.planned_fallback || !interval.has_any_date() => None,
            (start, end) => {
                let start = start.or(interval.actual_start).unwrap_or(today);
                let end = end
                    .or(interval.actual_end)
                    .unwrap_or_else(|| shift_days(start, self.config.fallback_days));
                Some((Span::new(start, end), true))
            }
        }
    }

    /// Actual span of an interval.
    ///
    /// Requires an actual start. An unfinished stage without an actual end
    /// runs to today (flagged); a finished one without an end is one day.
    pub fn actual_span(
        &self,
        interval: &AggregatedStageInterval,
        today: NaiveDate,
    ) -> Option<(Span, bool)> {
        let start = interval.actual_start?;
        match interval.actual_end {
            Some(end) => Some((Span::new(start, end), false)),
            None if !interval.is_complete() => Some((Span::new(start, today), true)),
            None => Some((Span::new(start, start), false)),
        }
    }

    /// First and exclusive last day of the chart for a set of dates
    pub fn chart_range(
        &self,
        dates: impl IntoIterator<Item = NaiveDate>,
        today: NaiveDate,
    ) -> (NaiveDate, NaiveDate) {
        let bounds = dates.into_iter().fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((d.min(lo), d.max(hi))),
        });
        let (min, max) = bounds.unwrap_or((today, today));

        let start = add_months(month_floor(min), -(self.config.lead_months as i32));
        let reachable_today = today.min(add_months(max, self.config.max_trail_months as i32));
        let anchor = max.max(reachable_today);
        let end = add_months(month_floor(anchor), 1 + self.config.trail_months as i32);
        (start, end)
    }

    fn milestone(
        &self,
        entries: &[StageEvaluation],
        mode: ViewMode,
        catalog: &StageCatalog,
    ) -> Option<(NaiveDate, MarkerSource)> {
        if mode != ViewMode::PerProject {
            return None;
        }
        let projects: BTreeSet<&str> = entries
            .iter()
            .map(|e| e.interval.project_id.as_str())
            .collect();
        if projects.len() != 1 {
            return None;
        }

        let interval = &entries
            .iter()
            .find(|e| e.interval.stage == catalog.milestone())?
            .interval;
        interval
            .planned_end
            .map(|d| (d, MarkerSource::Planned))
            .or_else(|| interval.actual_end.map(|d| (d, MarkerSource::Actual)))
    }

    fn bar(
        &self,
        chart_start: NaiveDate,
        lane_index: usize,
        kind: BarKind,
        (span, flag): (Span, bool),
        status: StatusCategory,
    ) -> Bar {
        let width = self.config.month_width;
        let start_pos = position(chart_start, span.start, width);
        let natural_end = position(chart_start, shift_days(span.end, 1), width);
        let end_pos = natural_end.max(start_pos + self.config.min_bar_width);

        let extended_to_today = kind == BarKind::Actual && flag;
        let estimated = kind == BarKind::Planned && flag;
        let mut style_class = format!("bar-{} {}", kind.as_str(), status.style_class());
        if extended_to_today {
            style_class.push_str(" extended");
        }
        if estimated {
            style_class.push_str(" estimated");
        }

        Bar {
            lane_index,
            kind,
            start: span.start,
            end: span.end,
            start_pos,
            end_pos,
            style_class,
            layer: if kind == BarKind::Actual { 2 } else { 1 },
            extended_to_today,
            estimated,
        }
    }

    fn overlap(&self, chart_start: NaiveDate, spans: &LaneSpans) -> Option<OverlapRegion> {
        let (planned, _) = spans.planned?;
        let (actual, _) = spans.actual?;
        let common = planned.intersect(&actual)?;
        let width = self.config.month_width;
        Some(OverlapRegion {
            start: common.start,
            end: common.end,
            start_pos: position(chart_start, common.start, width),
            end_pos: position(chart_start, shift_days(common.end, 1), width),
            top: top_bar(&planned, &actual),
        })
    }

    /// Lay out evaluated intervals, already in display order
    pub fn layout(
        &self,
        entries: &[StageEvaluation],
        view: &ViewState,
        catalog: &StageCatalog,
        today: NaiveDate,
    ) -> Timeline {
        let mode = view.mode();
        let visualization = view.visualization;

        let spans: Vec<LaneSpans> = entries
            .iter()
            .map(|e| LaneSpans {
                planned: visualization
                    .shows_planned()
                    .then(|| self.planned_span(&e.interval, today))
                    .flatten(),
                actual: visualization
                    .shows_actual()
                    .then(|| self.actual_span(&e.interval, today))
                    .flatten(),
            })
            .collect();

        let milestone = self.milestone(entries, mode, catalog);
        let dates = spans
            .iter()
            .flat_map(|s| [s.planned, s.actual])
            .flatten()
            .flat_map(|(span, _)| [span.start, span.end])
            .chain(milestone.map(|(date, _)| date));
        let (chart_start, chart_end) = self.chart_range(dates, today);
        let width = self.config.month_width;

        let distinct_projects: BTreeSet<&str> = entries
            .iter()
            .map(|e| e.interval.project_id.as_str())
            .collect();
        let gap = if mode == ViewMode::PerProject && distinct_projects.len() > 1 {
            self.config.project_gap
        } else {
            0.0
        };

        let mut lanes = Vec::with_capacity(entries.len());
        let mut groups = 0usize;
        let mut previous: Option<&str> = None;

        for (index, (entry, lane_spans)) in entries.iter().zip(&spans).enumerate() {
            let interval = &entry.interval;
            let project = interval.project_id.as_str();
            if previous.is_some_and(|p| p != project) {
                groups += 1;
            }
            previous = Some(project);

            let mut bars = Vec::with_capacity(2);
            if let Some(planned) = lane_spans.planned {
                bars.push(self.bar(chart_start, index, BarKind::Planned, planned, entry.status));
            }
            if let Some(actual) = lane_spans.actual {
                bars.push(self.bar(chart_start, index, BarKind::Actual, actual, entry.status));
            }

            let overlap = self.overlap(chart_start, lane_spans);
            if let Some(region) = &overlap {
                for bar in &mut bars {
                    bar.layer = if bar.kind == region.top { 2 } else { 1 };
                }
            }

            let label = match mode {
                ViewMode::PerProject => interval.stage.display_name().to_string(),
                ViewMode::Consolidated => interval.project_id.clone(),
            };

            lanes.push(Lane {
                index,
                label,
                project_id: interval.project_id.clone(),
                stage: interval.stage,
                ordinal_position: index as f64 + groups as f64 * gap,
                status: entry.status,
                completion_pct: interval.completion_pct,
                bars,
                overlap,
            });
        }

        debug!(
            lanes = lanes.len(),
            %chart_start,
            %chart_end,
            "timeline laid out"
        );

        Timeline {
            mode,
            chart_start,
            chart_end,
            month_width: width,
            today,
            today_marker_pos: position(chart_start, today, width),
            milestone_marker: milestone.map(|(date, source)| MilestoneMarker {
                stage: catalog.milestone(),
                date,
                source,
                pos: position(chart_start, date, width),
            }),
            lanes,
        }
    }
}
