//! Text formatting for the report, status and stages commands

use std::fmt::{self, Write};

use chrono::NaiveDate;
use stagetrack_core::{BufferPolicy, StageCatalog, StatusSummary};
use stagetrack_pipeline::{Pivot, Report};
use stagetrack_render::StatusPalette;

fn opt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn opt_days(days: Option<i64>) -> String {
    days.map_or_else(|| "-".to_string(), |d| format!("{:+}", d))
}

/// Hierarchical report: one header per project followed by its stages
pub fn report_text(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Report as of {}", report.today)?;

    if report.rows.is_empty() {
        writeln!(out, "No data for the current selection.")?;
        return Ok(out);
    }

    for rollup in &report.rollups {
        writeln!(out)?;
        writeln!(
            out,
            "{} [{}]  planned {} .. {}  actual {} .. {}  variance {}  {:.0}%",
            rollup.project,
            rollup.org_unit.as_deref().unwrap_or("-"),
            opt_date(rollup.planned_start),
            opt_date(rollup.planned_end),
            opt_date(rollup.actual_start),
            opt_date(rollup.actual_end),
            opt_days(rollup.variance_days),
            rollup.completion_pct,
        )?;
        for row in report.rows.iter().filter(|r| r.project == rollup.project) {
            writeln!(
                out,
                "  {:<24} {:>10} {:>10} {:>10} {:>10} {:>5.0}% {:>5} {:>5}  {}",
                row.stage_name,
                opt_date(row.planned_start),
                opt_date(row.planned_end),
                opt_date(row.actual_start),
                opt_date(row.actual_end),
                row.completion_pct,
                opt_days(row.variance_days),
                opt_days(row.duration_variance_days),
                row.status,
            )?;
        }
    }

    writeln!(out)?;
    out.push_str(&status_text(&report.summary)?);
    Ok(out)
}

/// Wide table, tab separated: org unit, project, then five columns per stage
pub fn pivot_text(pivot: &Pivot) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "org_unit\tproject")?;
    for stage in &pivot.stages {
        let code = stage.code();
        write!(
            out,
            "\t{code} planned_start\t{code} planned_end\t{code} actual_start\t{code} actual_end\t{code} variance"
        )?;
    }
    writeln!(out)?;

    for row in &pivot.rows {
        write!(out, "{}\t{}", row.org_unit.as_deref().unwrap_or("-"), row.project)?;
        for cell in &row.cells {
            match cell {
                Some(cell) => write!(
                    out,
                    "\t{}\t{}\t{}\t{}\t{}",
                    opt_date(cell.planned_start),
                    opt_date(cell.planned_end),
                    opt_date(cell.actual_start),
                    opt_date(cell.actual_end),
                    opt_days(cell.variance_days),
                )?,
                None => write!(out, "\t-\t-\t-\t-\t-")?,
            }
        }
        writeln!(out)?;
    }
    Ok(out)
}

/// Counts per status category with their legend labels
pub fn status_text(summary: &StatusSummary) -> Result<String, fmt::Error> {
    let palette = StatusPalette::standard();
    let mut out = String::new();
    for entry in palette.legend() {
        writeln!(
            out,
            "{:<22} {:>4}  {} ({})",
            entry.status.as_str(),
            summary.count(entry.status),
            entry.label,
            entry.color,
        )?;
    }
    writeln!(
        out,
        "{:<22} {:>4}  {} complete",
        "total",
        summary.total(),
        summary.completed()
    )?;
    Ok(out)
}

/// Canonical stage table with the buffer shift of each stage
pub fn stages_text(catalog: &StageCatalog, buffer: &BufferPolicy) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{:<3} {:<5} {:<24} {}", "#", "CODE", "NAME", "BUFFER")?;
    for stage in catalog.stages() {
        let marker = if *stage == catalog.milestone() { " *" } else { "" };
        writeln!(
            out,
            "{:<3} {:<5} {:<24} {}{}",
            catalog.order_index(*stage) + 1,
            stage.code(),
            stage.display_name(),
            buffer.shift_kind(*stage).as_str(),
            marker,
        )?;
    }
    writeln!(out, "* milestone stage")?;
    Ok(out)
}
