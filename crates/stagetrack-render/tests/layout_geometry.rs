//! Layout engine geometry tests

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use stagetrack_core::{
    AggregatedStageInterval, BarKind, MarkerSource, StageCatalog, StageCode, StageEvaluation,
    StatusCategory, VarianceMetric, ViewMode, ViewState, VisualizationMode,
};
use stagetrack_render::{position, LayoutConfig, LayoutEngine};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn entry(interval: AggregatedStageInterval) -> StageEvaluation {
    StageEvaluation {
        interval,
        variance: VarianceMetric::default(),
        status: StatusCategory::OnTrackInProgress,
    }
}

fn layout(entries: &[StageEvaluation], view: &ViewState) -> stagetrack_core::Timeline {
    LayoutEngine::default().layout(entries, view, &StageCatalog::standard(), date(2024, 6, 1))
}

#[test]
fn overlap_of_intersecting_bars() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Dm)
            .planned(date(2024, 1, 1), date(2024, 1, 31))
            .actual(date(2024, 1, 15), date(2024, 2, 15))
            .completion(100.0),
    )];
    let timeline = layout(&entries, &ViewState::new());
    let lane = &timeline.lanes[0];

    let overlap = lane.overlap.as_ref().expect("bars intersect");
    assert_eq!(overlap.start, date(2024, 1, 15));
    assert_eq!(overlap.end, date(2024, 1, 31));
    assert_eq!(
        overlap.start_pos,
        position(timeline.chart_start, date(2024, 1, 15), timeline.month_width)
    );
    assert_eq!(
        overlap.end_pos,
        position(timeline.chart_start, date(2024, 2, 1), timeline.month_width)
    );
    // neither range contains the other
    assert_eq!(overlap.top, BarKind::Actual);
}

#[test]
fn no_overlap_when_actual_starts_after_planned_end() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Dm)
            .planned(date(2024, 1, 1), date(2024, 1, 31))
            .actual(date(2024, 2, 5), date(2024, 2, 20)),
    )];
    let timeline = layout(&entries, &ViewState::new());
    assert!(timeline.lanes[0].overlap.is_none());
    assert_eq!(timeline.lanes[0].bars.len(), 2);
}

#[test]
fn contained_shorter_bar_is_on_top() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Eng)
            .planned(date(2024, 3, 10), date(2024, 3, 20))
            .actual(date(2024, 3, 1), date(2024, 4, 30)),
    )];
    let timeline = layout(&entries, &ViewState::new());
    let lane = &timeline.lanes[0];
    assert_eq!(lane.overlap.as_ref().unwrap().top, BarKind::Planned);
    assert_eq!(lane.bar(BarKind::Planned).unwrap().layer, 2);
    assert_eq!(lane.bar(BarKind::Actual).unwrap().layer, 1);
}

#[test]
fn chart_range_and_positions() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Dm)
            .planned(date(2024, 2, 1), date(2024, 2, 29)),
    )];
    let timeline = layout(&entries, &ViewState::new());
    assert_eq!(timeline.chart_start, date(2024, 1, 1));
    // today (Jun 1) stretches the chart, plus one trailing month
    assert_eq!(timeline.chart_end, date(2024, 8, 1));
    assert_eq!(timeline.today_marker_pos, 5.0 * 30.0);

    let bar = timeline.lanes[0].bar(BarKind::Planned).unwrap();
    assert_eq!(bar.start_pos, 30.0);
    assert_eq!(bar.end_pos, 60.0);
    assert!(!bar.estimated);
}

#[test]
fn zero_length_bar_gets_minimum_width() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Ass)
            .planned(date(2024, 3, 1), date(2024, 3, 1)),
    )];
    let engine = LayoutEngine::new(LayoutConfig::new().min_bar_width(5.0));
    let timeline = engine.layout(
        &entries,
        &ViewState::new(),
        &StageCatalog::standard(),
        date(2024, 6, 1),
    );
    let bar = timeline.lanes[0].bar(BarKind::Planned).unwrap();
    assert_eq!(bar.width(), 5.0);
}

#[test]
fn running_stage_extends_to_today() {
    let mut interval = AggregatedStageInterval::new("Beta", StageCode::Doc)
        .planned(date(2024, 5, 1), date(2024, 6, 15))
        .completion(85.0);
    interval.actual_start = Some(date(2024, 5, 5));

    let timeline = layout(&[entry(interval)], &ViewState::new());
    let actual = timeline.lanes[0].bar(BarKind::Actual).unwrap();
    assert!(actual.extended_to_today);
    assert_eq!(actual.end, date(2024, 6, 1));
    assert!(actual.style_class.contains("extended"));
}

#[test]
fn estimated_planned_bar_from_actuals() {
    let mut interval = AggregatedStageInterval::new("Gamma", StageCode::Dm).completion(100.0);
    interval.actual_start = Some(date(2024, 1, 12));
    interval.actual_end = Some(date(2024, 2, 1));

    let timeline = layout(&[entry(interval)], &ViewState::new());
    let planned = timeline.lanes[0].bar(BarKind::Planned).unwrap();
    assert!(planned.estimated);
    assert_eq!(planned.start, date(2024, 1, 12));
    assert_eq!(planned.end, date(2024, 2, 1));
}

#[test]
fn visualization_mode_filters_bars() {
    let entries = [entry(
        AggregatedStageInterval::new("Alpha", StageCode::Dm)
            .planned(date(2024, 1, 1), date(2024, 1, 31))
            .actual(date(2024, 1, 15), date(2024, 2, 15)),
    )];

    let planned_only = layout(&entries, &ViewState::new().visualization(VisualizationMode::Planned));
    let lane = &planned_only.lanes[0];
    assert_eq!(lane.bars.len(), 1);
    assert_eq!(lane.bars[0].kind, BarKind::Planned);
    assert!(lane.overlap.is_none());

    let actual_only = layout(&entries, &ViewState::new().visualization(VisualizationMode::Actual));
    assert_eq!(actual_only.lanes[0].bars[0].kind, BarKind::Actual);
}

#[test]
fn project_groups_are_separated() {
    let entries = [
        entry(AggregatedStageInterval::new("Alpha", StageCode::Dm).planned(date(2024, 1, 1), date(2024, 1, 31))),
        entry(AggregatedStageInterval::new("Alpha", StageCode::Doc).planned(date(2024, 2, 1), date(2024, 2, 28))),
        entry(AggregatedStageInterval::new("Beta", StageCode::Dm).planned(date(2024, 3, 1), date(2024, 3, 31))),
    ];
    let timeline = layout(&entries, &ViewState::new());
    let ordinals: Vec<f64> = timeline.lanes.iter().map(|l| l.ordinal_position).collect();
    assert_eq!(ordinals, vec![0.0, 1.0, 2.75]);
    assert_eq!(timeline.lanes[0].label, "1.DEFINIÇÃO DO MÓDULO");
    assert!(timeline.milestone_marker.is_none());
}

#[test]
fn consolidated_lanes_are_projects() {
    let entries = [
        entry(AggregatedStageInterval::new("Alpha", StageCode::Dm).planned(date(2024, 1, 1), date(2024, 1, 31))),
        entry(AggregatedStageInterval::new("Beta", StageCode::Dm).planned(date(2024, 3, 1), date(2024, 3, 31))),
    ];
    let view = ViewState::new().stage(StageCode::Dm);
    let timeline = layout(&entries, &view);
    assert_eq!(timeline.mode, ViewMode::Consolidated);
    let labels: Vec<&str> = timeline.lanes.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["Alpha", "Beta"]);
    assert_eq!(timeline.lanes[1].ordinal_position, 1.0);
}

#[test]
fn milestone_marker_for_single_project() {
    let entries = [
        entry(AggregatedStageInterval::new("Alpha", StageCode::Dm).planned(date(2024, 1, 1), date(2024, 1, 31))),
        entry(AggregatedStageInterval::new("Alpha", StageCode::Ass).actual(date(2024, 9, 1), date(2024, 9, 30))),
    ];
    let timeline = layout(&entries, &ViewState::new());
    let marker = timeline.milestone_marker.expect("single project with signature stage");
    assert_eq!(marker.stage, StageCode::Ass);
    assert_eq!(marker.date, date(2024, 9, 30));
    assert_eq!(marker.source, MarkerSource::Actual);
    assert!(timeline.chart_end > marker.date);
}

#[test]
fn empty_input_gives_empty_timeline() {
    let timeline = layout(&[], &ViewState::new());
    assert!(timeline.is_empty());
    assert!(timeline.chart_start <= timeline.today);
    assert!(timeline.chart_end > timeline.today);
}
