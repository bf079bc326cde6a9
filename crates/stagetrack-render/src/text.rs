//! Plain-text timeline renderer
//!
//! Draws a [`Timeline`] as a fixed-width character chart for terminals.
//!
//! ## Example Output
//!
//! ```text
//! Timeline 2024-01-01 .. 2024-07-01 (per project)
//!                              +---------+---------+---------+---------+---------+---------
//! > Residencial Alfa
//! 1.DEFINIÇÃO DO MÓDULO        |     ====%%%%##                     |     100% late_complete
//! 2.DOCUMENTAÇÃO               |           ======%%%%%%%#           |     100% late_complete
//! ```
//!
//! `=` planned, `#` actual, `|` today. Where both bars overlap, the cell
//! shows the bar on top: `%` for the actual bar, `&` for a planned bar
//! lying inside a longer actual one.

use stagetrack_core::{
    Bar, BarKind, Lane, MarkerSource, RenderError, Renderer, Timeline, ViewMode,
};

fn bar_char(kind: BarKind) -> char {
    match kind {
        BarKind::Planned => '=',
        BarKind::Actual => '#',
    }
}

/// Overlap cell, by the bar drawn on top
fn overlap_char(top: BarKind) -> char {
    match top {
        BarKind::Planned => '&',
        BarKind::Actual => '%',
    }
}

/// Fixed-width text chart renderer
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Characters used for the chart area
    pub chart_width: usize,
    /// Characters reserved for lane labels
    pub label_width: usize,
    /// Append completion and status after each lane
    pub show_status: bool,
    /// Print the symbol legend at the end
    pub show_legend: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            chart_width: 60,
            label_width: 28,
            show_status: true,
            show_legend: true,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart_width(mut self, width: usize) -> Self {
        self.chart_width = width;
        self
    }

    pub fn label_width(mut self, width: usize) -> Self {
        self.label_width = width;
        self
    }

    pub fn no_status(mut self) -> Self {
        self.show_status = false;
        self
    }

    pub fn no_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }

    /// Position units per character cell
    fn scale(&self, timeline: &Timeline) -> f64 {
        timeline.width() / self.chart_width as f64
    }

    fn cell_range(&self, col: usize, scale: f64) -> (f64, f64) {
        (col as f64 * scale, (col + 1) as f64 * scale)
    }

    fn today_column(&self, timeline: &Timeline, scale: f64) -> Option<usize> {
        let pos = timeline.today_marker_pos;
        (pos >= 0.0 && pos < timeline.width()).then(|| ((pos / scale) as usize).min(self.chart_width - 1))
    }

    fn axis(&self, timeline: &Timeline, scale: f64) -> String {
        let mut cells = vec!['-'; self.chart_width];
        let months = (timeline.width() / timeline.month_width).round() as usize;
        for month in 0..months {
            let col = ((month as f64 * timeline.month_width) / scale) as usize;
            if let Some(cell) = cells.get_mut(col) {
                *cell = '+';
            }
        }
        cells.into_iter().collect()
    }

    fn lane_cells(&self, lane: &Lane, scale: f64, today_col: Option<usize>) -> String {
        let covers = |start: f64, end: f64, col: usize| {
            let (a, b) = self.cell_range(col, scale);
            start < b && end > a
        };

        // highest layer first
        let mut bars: Vec<&Bar> = lane.bars.iter().collect();
        bars.sort_by(|a, b| b.layer.cmp(&a.layer));

        (0..self.chart_width)
            .map(|col| {
                if let Some(region) = lane
                    .overlap
                    .as_ref()
                    .filter(|o| covers(o.start_pos, o.end_pos, col))
                {
                    return overlap_char(region.top);
                }
                if let Some(bar) = bars.iter().find(|b| covers(b.start_pos, b.end_pos, col)) {
                    return bar_char(bar.kind);
                }
                if today_col == Some(col) {
                    '|'
                } else {
                    ' '
                }
            })
            .collect()
    }

    fn label(&self, text: &str) -> String {
        let truncated: String = if text.chars().count() > self.label_width {
            let keep = self.label_width.saturating_sub(1);
            text.chars().take(keep).chain(std::iter::once('~')).collect()
        } else {
            text.to_string()
        };
        format!("{:<width$}", truncated, width = self.label_width)
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, timeline: &Timeline) -> Result<String, RenderError> {
        if self.chart_width == 0 {
            return Err(RenderError::Format("chart width must be positive".into()));
        }
        if timeline.lanes.is_empty() {
            return Ok("No data for the current selection.\n".into());
        }
        if timeline.width() <= 0.0 {
            return Err(RenderError::InvalidData(format!(
                "empty chart range {} .. {}",
                timeline.chart_start, timeline.chart_end
            )));
        }

        let scale = self.scale(timeline);
        let today_col = self.today_column(timeline, scale);
        let mode = match timeline.mode {
            ViewMode::PerProject => "per project",
            ViewMode::Consolidated => "consolidated",
        };

        let mut out = String::new();
        out.push_str(&format!(
            "Timeline {} .. {} ({})\n",
            timeline.chart_start, timeline.chart_end, mode
        ));
        out.push_str(&format!(
            "{} {}\n",
            " ".repeat(self.label_width),
            self.axis(timeline, scale)
        ));

        let mut previous_project: Option<&str> = None;
        for lane in &timeline.lanes {
            if timeline.mode == ViewMode::PerProject
                && previous_project != Some(lane.project_id.as_str())
            {
                if previous_project.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("> {}\n", lane.project_id));
                previous_project = Some(lane.project_id.as_str());
            }

            out.push_str(&self.label(&lane.label));
            out.push('|');
            out.push_str(&self.lane_cells(lane, scale, today_col));
            out.push('|');
            if self.show_status {
                out.push_str(&format!(" {:>5.0}% {}", lane.completion_pct, lane.status));
            }
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&format!("Today: {}\n", timeline.today));
        if let Some(marker) = &timeline.milestone_marker {
            out.push_str(&format!(
                "Milestone {} ({}): {}\n",
                marker.stage,
                match marker.source {
                    MarkerSource::Planned => "planned",
                    MarkerSource::Actual => "actual",
                },
                marker.date
            ));
        }
        if self.show_legend {
            out.push_str("Legend: = planned  # actual  % overlap  & planned inside actual  | today\n");
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagetrack_core::{OverlapRegion, StageCode, StatusCategory};

    #[test]
    fn label_truncation() {
        let renderer = TextRenderer::new().label_width(6);
        assert_eq!(renderer.label("ABC"), "ABC   ");
        assert_eq!(renderer.label("DOCUMENTAÇÃO"), "DOCUM~");
    }

    fn bar(kind: BarKind, start_pos: f64, end_pos: f64, layer: u8) -> Bar {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Bar {
            lane_index: 0,
            kind,
            start: d,
            end: d,
            start_pos,
            end_pos,
            style_class: String::new(),
            layer,
            extended_to_today: false,
            estimated: false,
        }
    }

    fn lane(bars: Vec<Bar>, overlap: Option<OverlapRegion>) -> Lane {
        Lane {
            index: 0,
            label: "DM".into(),
            project_id: "A".into(),
            stage: StageCode::Dm,
            ordinal_position: 0.0,
            status: StatusCategory::NoData,
            completion_pct: 0.0,
            bars,
            overlap,
        }
    }

    fn region(start_pos: f64, end_pos: f64, top: BarKind) -> OverlapRegion {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        OverlapRegion {
            start: d,
            end: d,
            start_pos,
            end_pos,
            top,
        }
    }

    #[test]
    fn contained_planned_bar_stays_visible() {
        // one position unit per cell
        let renderer = TextRenderer::new().chart_width(10);
        let lane = lane(
            vec![
                bar(BarKind::Planned, 3.0, 5.0, 2),
                bar(BarKind::Actual, 1.0, 8.0, 1),
            ],
            Some(region(3.0, 5.0, BarKind::Planned)),
        );
        assert_eq!(renderer.lane_cells(&lane, 1.0, None), " ##&&###  ");
    }

    #[test]
    fn actual_on_top_of_partial_overlap() {
        let renderer = TextRenderer::new().chart_width(10);
        let lane = lane(
            vec![
                bar(BarKind::Planned, 0.0, 4.0, 1),
                bar(BarKind::Actual, 2.0, 6.0, 2),
            ],
            Some(region(2.0, 4.0, BarKind::Actual)),
        );
        assert_eq!(renderer.lane_cells(&lane, 1.0, Some(8)), "==%%##  | ");
    }

    #[test]
    fn higher_layer_wins_outside_the_overlap() {
        // bars touching through the minimum-width floor without a region
        let renderer = TextRenderer::new().chart_width(6);
        let lane = lane(
            vec![
                bar(BarKind::Actual, 0.0, 3.0, 1),
                bar(BarKind::Planned, 2.0, 5.0, 2),
            ],
            None,
        );
        assert_eq!(renderer.lane_cells(&lane, 1.0, None), "##=== ");
    }

    #[test]
    fn zero_width_is_an_error() {
        use chrono::NaiveDate;
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let timeline = Timeline {
            mode: ViewMode::PerProject,
            chart_start: d,
            chart_end: d,
            month_width: 30.0,
            today: d,
            today_marker_pos: 0.0,
            milestone_marker: None,
            lanes: Vec::new(),
        };
        let result = TextRenderer::new().chart_width(0).render(&timeline);
        assert!(matches!(result, Err(RenderError::Format(_))));
    }
}
