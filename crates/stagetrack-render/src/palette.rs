//! Status colours and legend

use serde::{Deserialize, Serialize};

use stagetrack_core::{BarKind, StatusCategory};

/// Colour table for renderers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusPalette {
    pub on_time_complete: String,
    pub late_complete: String,
    pub overdue_in_progress: String,
    pub on_track_in_progress: String,
    pub no_data: String,
    pub planned_bar: String,
    pub actual_bar: String,
    pub overlap: String,
    pub today_line: String,
    pub milestone: String,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self::standard()
    }
}

impl StatusPalette {
    pub fn standard() -> Self {
        Self {
            on_time_complete: "#2EAF5B".into(),
            late_complete: "#C30202".into(),
            overdue_in_progress: "#A38408".into(),
            on_track_in_progress: "#000000".into(),
            no_data: "#9E9E9E".into(),
            planned_bar: "#A8C5DA".into(),
            actual_bar: "#174C66".into(),
            overlap: "#5D8AA8".into(),
            today_line: "#E74C3C".into(),
            milestone: "#8E44AD".into(),
        }
    }

    /// Colour of a status category
    pub fn status_color(&self, status: StatusCategory) -> &str {
        match status {
            StatusCategory::OnTimeComplete => &self.on_time_complete,
            StatusCategory::LateComplete => &self.late_complete,
            StatusCategory::OverdueInProgress => &self.overdue_in_progress,
            StatusCategory::OnTrackInProgress => &self.on_track_in_progress,
            StatusCategory::NoData => &self.no_data,
        }
    }

    /// Fill colour of a bar kind
    pub fn bar_color(&self, kind: BarKind) -> &str {
        match kind {
            BarKind::Planned => &self.planned_bar,
            BarKind::Actual => &self.actual_bar,
        }
    }

    /// Legend entries in category order
    pub fn legend(&self) -> Vec<LegendEntry> {
        StatusCategory::ALL
            .iter()
            .map(|status| LegendEntry {
                status: *status,
                color: self.status_color(*status).to_string(),
                label: status.label().to_string(),
            })
            .collect()
    }
}

/// One line of the status legend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub status: StatusCategory,
    pub color: String,
    pub label: String,
}
