//! Stage status classification
//!
//! Each aggregated stage falls into exactly one [`StatusCategory`], derived
//! from its completion, its planned and actual end dates, and the reference
//! "today" date. [`StatusSummary`] counts categories across an evaluation.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use stagetrack_core::status::{classify, StatusCategory};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day);
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//!
//! assert_eq!(
//!     classify(100.0, d(2, 28), d(3, 2), today),
//!     StatusCategory::LateComplete
//! );
//! assert_eq!(
//!     classify(40.0, d(5, 30), None, today),
//!     StatusCategory::OnTrackInProgress
//! );
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::is_complete;

// ============================================================================
// Core Types
// ============================================================================

/// Status of one aggregated stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    /// Complete, finished on or before the planned end
    OnTimeComplete,
    /// Complete, finished after the planned end
    LateComplete,
    /// Not complete, and the actual end recorded is already in the past
    OverdueInProgress,
    /// Not complete, nothing indicates it is late yet
    OnTrackInProgress,
    /// Neither a planned nor an actual end date
    NoData,
}

impl StatusCategory {
    /// All categories, in legend order
    pub const ALL: [StatusCategory; 5] = [
        StatusCategory::OnTimeComplete,
        StatusCategory::LateComplete,
        StatusCategory::OverdueInProgress,
        StatusCategory::OnTrackInProgress,
        StatusCategory::NoData,
    ];

    /// Machine name, e.g. `"late_complete"`
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::OnTimeComplete => "on_time_complete",
            StatusCategory::LateComplete => "late_complete",
            StatusCategory::OverdueInProgress => "overdue_in_progress",
            StatusCategory::OnTrackInProgress => "on_track_in_progress",
            StatusCategory::NoData => "no_data",
        }
    }

    /// CSS-like class used as a renderer style hook
    pub fn style_class(&self) -> &'static str {
        match self {
            StatusCategory::OnTimeComplete => "status-on-time-complete",
            StatusCategory::LateComplete => "status-late-complete",
            StatusCategory::OverdueInProgress => "status-overdue",
            StatusCategory::OnTrackInProgress => "status-on-track",
            StatusCategory::NoData => "status-no-data",
        }
    }

    /// Human-readable legend label
    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::OnTimeComplete => "Complete (on time)",
            StatusCategory::LateComplete => "Complete (late)",
            StatusCategory::OverdueInProgress => "Overdue / awaiting update",
            StatusCategory::OnTrackInProgress => "In progress",
            StatusCategory::NoData => "No data",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            StatusCategory::OnTimeComplete | StatusCategory::LateComplete
        )
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Classify a stage.
///
/// Rules, first match wins:
/// - no planned end and no actual end: `NoData`
/// - complete and `actual_end > planned_end`: `LateComplete`
/// - complete otherwise (including equal dates or a missing date): `OnTimeComplete`
/// - in progress with `actual_end < today`: `OverdueInProgress`
/// - in progress otherwise: `OnTrackInProgress`
pub fn classify(
    completion_pct: f64,
    planned_end: Option<NaiveDate>,
    actual_end: Option<NaiveDate>,
    today: NaiveDate,
) -> StatusCategory {
    if planned_end.is_none() && actual_end.is_none() {
        return StatusCategory::NoData;
    }

    if is_complete(completion_pct) {
        return match (actual_end, planned_end) {
            (Some(actual), Some(planned)) if actual > planned => StatusCategory::LateComplete,
            _ => StatusCategory::OnTimeComplete,
        };
    }

    match actual_end {
        Some(actual) if actual < today => StatusCategory::OverdueInProgress,
        _ => StatusCategory::OnTrackInProgress,
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Count of stages per status category
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub on_time_complete: usize,
    pub late_complete: usize,
    pub overdue_in_progress: usize,
    pub on_track_in_progress: usize,
    pub no_data: usize,
}

impl StatusSummary {
    /// Count the categories of an iterator of statuses
    pub fn from_statuses(statuses: impl IntoIterator<Item = StatusCategory>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            summary.record(status);
        }
        summary
    }

    /// Add one status to the counts
    pub fn record(&mut self, status: StatusCategory) {
        match status {
            StatusCategory::OnTimeComplete => self.on_time_complete += 1,
            StatusCategory::LateComplete => self.late_complete += 1,
            StatusCategory::OverdueInProgress => self.overdue_in_progress += 1,
            StatusCategory::OnTrackInProgress => self.on_track_in_progress += 1,
            StatusCategory::NoData => self.no_data += 1,
        }
    }

    /// Count for one category
    pub fn count(&self, status: StatusCategory) -> usize {
        match status {
            StatusCategory::OnTimeComplete => self.on_time_complete,
            StatusCategory::LateComplete => self.late_complete,
            StatusCategory::OverdueInProgress => self.overdue_in_progress,
            StatusCategory::OnTrackInProgress => self.on_track_in_progress,
            StatusCategory::NoData => self.no_data,
        }
    }

    pub fn total(&self) -> usize {
        StatusCategory::ALL.iter().map(|s| self.count(*s)).sum()
    }

    pub fn completed(&self) -> usize {
        self.on_time_complete + self.late_complete
    }
}

// ============================================================================
// Tests
// ============================================================================
