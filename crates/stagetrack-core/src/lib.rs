//! # stagetrack-core
//!
//! Core domain model and rules for the stagetrack planned-vs-actual engine.
//!
//! This crate provides:
//! - Domain types: `RawStageRecord`, `AggregatedStageInterval`, `VarianceMetric`
//! - The stage catalog and canonicalizer (`stage`)
//! - Business-day calendar arithmetic (`calendar`)
//! - The status classifier (`status`)
//! - View state and filters (`view`)
//! - Timeline output geometry: `Timeline`, `Lane`, `Bar`, `OverlapRegion`
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use stagetrack_core::{RawStageRecord, StageCode, StageCatalog};
//!
//! let catalog = StageCatalog::standard();
//! let record = RawStageRecord::new("Residencial Alfa", "Planejamento")
//!     .org_unit("UGB1")
//!     .planned(
//!         NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
//!     )
//!     .completion(0.5);
//!
//! assert_eq!(catalog.canonicalize(record.stage_label.as_deref()), StageCode::Dm);
//! ```

pub mod calendar;
pub mod stage;
pub mod status;
pub mod view;

pub use calendar::BusinessCalendar;
pub use stage::{StageCatalog, StageCode};
pub use status::{StatusCategory, StatusSummary};
pub use view::{BufferPolicy, ShiftKind, ViewFilters, ViewMode, ViewState, VisualizationMode};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier (and display name) of a project
pub type ProjectId = String;

/// Identifier of an organisational unit grouping projects
pub type OrgUnitId = String;

/// Completion value treated as "done"
pub const COMPLETE_PCT: f64 = 100.0;

/// Observed completion values at or below this are read on a 0-1 scale.
/// The slack above 1.0 absorbs float noise from spreadsheet exports.
pub const FRACTION_SCALE_LIMIT: f64 = 1.01;

/// Normalize an observed completion value to the 0-100 scale.
///
/// Values up to [`FRACTION_SCALE_LIMIT`] are fractions and get scaled by 100.
/// Anything that lands outside `[0, 100]` after scaling, or is not finite,
/// is not a usable percentage and yields `None`.
pub fn normalize_completion(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = if value <= FRACTION_SCALE_LIMIT {
        (value * 100.0).min(COMPLETE_PCT)
    } else {
        value
    };
    (0.0..=COMPLETE_PCT).contains(&scaled).then_some(scaled)
}

/// Whether a normalized completion value counts as complete
pub fn is_complete(pct: f64) -> bool {
    pct >= COMPLETE_PCT - 1e-9
}

// ============================================================================
// Raw Records
// ============================================================================

/// One ingested row describing (part of) a stage of a project.
///
/// Records are immutable once ingested. Several records may describe the
/// same (project, stage); the aggregator folds them together. Planned and
/// actual dates frequently arrive from different sources, so any field
/// may be missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawStageRecord {
    /// Project identifier, also used as display name
    pub project_id: ProjectId,
    /// Organisational unit owning the project
    pub org_unit: Option<OrgUnitId>,
    /// Free-text stage label as found in the source
    pub stage_label: Option<String>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    /// Completion as observed, on either a 0-1 or a 0-100 scale
    pub completion: Option<f64>,
}

impl RawStageRecord {
    /// Create a record with only project and stage label set
    pub fn new(project_id: impl Into<String>, stage_label: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            org_unit: None,
            stage_label: Some(stage_label.into()),
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            completion: None,
        }
    }

    /// Set the organisational unit
    pub fn org_unit(mut self, org_unit: impl Into<String>) -> Self {
        self.org_unit = Some(org_unit.into());
        self
    }

    /// Set both planned dates
    pub fn planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    /// Set both actual dates
    pub fn actual(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.actual_start = Some(start);
        self.actual_end = Some(end);
        self
    }

    /// Set only the actual start (stage still running)
    pub fn started(mut self, start: NaiveDate) -> Self {
        self.actual_start = Some(start);
        self
    }

    /// Set the observed completion value
    pub fn completion(mut self, value: f64) -> Self {
        self.completion = Some(value);
        self
    }
}

// ============================================================================
// Aggregated Intervals
// ============================================================================

/// The consolidated planned/actual interval of one (project, stage).
///
/// Fully derived from raw records and recomputed on every evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStageInterval {
    pub project_id: ProjectId,
    /// First organisational unit seen for the project in the group
    pub org_unit: Option<OrgUnitId>,
    pub stage: StageCode,
    /// Earliest planned start
    pub planned_start: Option<NaiveDate>,
    /// Latest planned end
    pub planned_end: Option<NaiveDate>,
    /// Earliest actual start
    pub actual_start: Option<NaiveDate>,
    /// Latest actual end
    pub actual_end: Option<NaiveDate>,
    /// Mean of the valid completion values, 0-100
    pub completion_pct: f64,
    /// Number of raw records folded into this interval
    pub record_count: usize,
}

impl AggregatedStageInterval {
    /// Create an empty interval for (project, stage)
    pub fn new(project_id: impl Into<String>, stage: StageCode) -> Self {
        Self {
            project_id: project_id.into(),
            org_unit: None,
            stage,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            completion_pct: 0.0,
            record_count: 0,
        }
    }

    /// Set both planned dates
    pub fn planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    /// Set both actual dates
    pub fn actual(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.actual_start = Some(start);
        self.actual_end = Some(end);
        self
    }

    /// Set the completion percentage (0-100)
    pub fn completion(mut self, pct: f64) -> Self {
        self.completion_pct = pct;
        self
    }

    /// Whether the stage is 100% complete
    pub fn is_complete(&self) -> bool {
        is_complete(self.completion_pct)
    }

    /// Whether any of the four dates is known
    pub fn has_any_date(&self) -> bool {
        self.planned_start.is_some()
            || self.planned_end.is_some()
            || self.actual_start.is_some()
            || self.actual_end.is_some()
    }

    /// All known dates of the interval
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        [
            self.planned_start,
            self.planned_end,
            self.actual_start,
            self.actual_end,
        ]
        .into_iter()
        .flatten()
    }
}

/// Signed business-day deviations of actual from planned.
///
/// Positive means late (termination) or longer (duration).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceMetric {
    /// Business days from planned end to actual end
    pub termination_variance_days: Option<i64>,
    /// Actual duration minus planned duration, in business days
    pub duration_variance_days: Option<i64>,
}

/// An aggregated interval together with its derived metrics for one evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageEvaluation {
    pub interval: AggregatedStageInterval,
    pub variance: VarianceMetric,
    pub status: StatusCategory,
}

// ============================================================================
// Timeline (Result)
// ============================================================================

/// Which date range a bar represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarKind {
    Planned,
    Actual,
}

impl BarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarKind::Planned => "planned",
            BarKind::Actual => "actual",
        }
    }
}

/// Transient render geometry for one planned or actual range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Index of the owning lane
    pub lane_index: usize,
    pub kind: BarKind,
    /// First day covered by the bar
    pub start: NaiveDate,
    /// Last day covered by the bar (inclusive)
    pub end: NaiveDate,
    pub start_pos: f64,
    pub end_pos: f64,
    /// Renderer style hook, e.g. `"bar-actual status-late-complete"`
    pub style_class: String,
    /// Stacking order within the lane, higher draws on top
    pub layer: u8,
    /// Actual bar whose end was extended to "today" for display
    pub extended_to_today: bool,
    /// Planned bar built from fallback dates rather than planned ones
    pub estimated: bool,
}

impl Bar {
    /// Width in position units
    pub fn width(&self) -> f64 {
        self.end_pos - self.start_pos
    }
}

/// Intersection of the planned and actual bars of one lane
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlapRegion {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_pos: f64,
    pub end_pos: f64,
    /// Bar drawn on top; the shorter one when one range contains the other
    pub top: BarKind,
}

/// One horizontal track of the timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Dense 0-based index
    pub index: usize,
    /// Display label (stage name in per-project mode, project in consolidated mode)
    pub label: String,
    pub project_id: ProjectId,
    pub stage: StageCode,
    /// Vertical position in lane units, including gaps between project groups
    pub ordinal_position: f64,
    pub status: StatusCategory,
    pub completion_pct: f64,
    /// At most one planned and one actual bar
    pub bars: Vec<Bar>,
    pub overlap: Option<OverlapRegion>,
}

impl Lane {
    /// Find the bar of a given kind
    pub fn bar(&self, kind: BarKind) -> Option<&Bar> {
        self.bars.iter().find(|b| b.kind == kind)
    }
}

/// Whether the milestone marker shows the planned or the actual date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSource {
    Planned,
    Actual,
}

/// Vertical marker at the milestone stage's end date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneMarker {
    pub stage: StageCode,
    pub date: NaiveDate,
    pub source: MarkerSource,
    pub pos: f64,
}

/// Complete layout handed to a rendering surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub mode: ViewMode,
    /// First day of the first month shown
    pub chart_start: NaiveDate,
    /// First day of the month after the last month shown (exclusive)
    pub chart_end: NaiveDate,
    /// Position units per calendar month
    pub month_width: f64,
    pub today: NaiveDate,
    pub today_marker_pos: f64,
    pub milestone_marker: Option<MilestoneMarker>,
    pub lanes: Vec<Lane>,
}

impl Timeline {
    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Total width of the chart area in position units
    pub fn width(&self) -> f64 {
        calendar::whole_months_between(self.chart_start, self.chart_end) as f64 * self.month_width
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering of a computed timeline
pub trait Renderer {
    type Output;

    /// Render a timeline to the output format
    fn render(&self, timeline: &Timeline) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
