//! Text renderer output over a full evaluation

use chrono::NaiveDate;
use stagetrack_core::{RawStageRecord, Renderer, StageCode, ViewState};
use stagetrack_pipeline::ViewDispatcher;
use stagetrack_render::{LayoutEngine, TextRenderer};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn records() -> Vec<RawStageRecord> {
    vec![
        RawStageRecord::new("Alpha", "DM")
            .planned(date(2024, 1, 1), date(2024, 1, 31))
            .actual(date(2024, 1, 15), date(2024, 2, 15))
            .completion(100.0),
        RawStageRecord::new("Alpha", "ASS").planned(date(2024, 5, 1), date(2024, 5, 20)),
        RawStageRecord::new("Beta", "DM")
            .planned(date(2024, 2, 1), date(2024, 2, 29))
            .started(date(2024, 2, 10))
            .completion(0.4),
    ]
}

fn render(view: &ViewState, renderer: &TextRenderer) -> String {
    let today = date(2024, 6, 1);
    let dispatcher = ViewDispatcher::default();
    let evaluation = dispatcher.evaluate(&records(), view, today);
    let timeline =
        LayoutEngine::default().layout(&evaluation.entries, view, dispatcher.catalog(), today);
    renderer.render(&timeline).unwrap()
}

#[test]
fn per_project_output_groups_lanes() {
    let text = render(&ViewState::new(), &TextRenderer::new());

    assert!(text.starts_with("Timeline 2023-12-01 .. 2024-08-01 (per project)\n"));
    assert!(text.contains("> Alpha\n"));
    assert!(text.contains("> Beta\n"));
    assert!(text.contains("1.DEFINIÇÃO DO MÓDULO"));
    assert!(text.contains("late_complete"));
    assert!(text.contains("Today: 2024-06-01\n"));
    assert!(text.ends_with("Legend: = planned  # actual  % overlap  & planned inside actual  | today\n"));
    // two projects, no milestone line
    assert!(!text.contains("Milestone"));
}

#[test]
fn overlap_cells_are_marked() {
    let text = render(&ViewState::new(), &TextRenderer::new().no_status());
    let alpha_dm = text
        .lines()
        .find(|l| l.starts_with("1.DEFINIÇÃO DO MÓDULO"))
        .unwrap();
    assert!(alpha_dm.contains('%'));
    assert!(alpha_dm.contains('#'));
    assert!(!alpha_dm.contains("late_complete"));
}

#[test]
fn consolidated_output_uses_project_labels() {
    let view = ViewState::new().stage(StageCode::Dm);
    let text = render(&view, &TextRenderer::new().no_legend());

    assert!(text.contains("(consolidated)"));
    assert!(!text.contains("> Alpha"));
    assert!(text.lines().any(|l| l.starts_with("Alpha ")));
    assert!(text.lines().any(|l| l.starts_with("Beta ")));
    assert!(!text.contains("Legend"));
}

#[test]
fn single_project_shows_milestone() {
    let filters = stagetrack_core::ViewFilters::default().projects(["Alpha"]);
    let view = ViewState::new().filters(filters);
    let text = render(&view, &TextRenderer::new());
    assert!(text.contains("Milestone ASS (planned): 2024-05-20\n"));
}

#[test]
fn empty_selection_message() {
    let filters = stagetrack_core::ViewFilters::default().org_units(Vec::<String>::new());
    let view = ViewState::new().filters(filters);
    let text = render(&view, &TextRenderer::new());
    assert_eq!(text, "No data for the current selection.\n");
}
