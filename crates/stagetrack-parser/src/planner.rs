//! Wide planner rows
//!
//! The module planner sheet has one row per project and one column per
//! (stage, kind, boundary), e.g. `DM.PREV.INÍCIO` or `DOC.REAL.TERMINO`.
//! [`unpivot_row`] turns such a row into one record per stage.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use stagetrack_core::RawStageRecord;

use crate::records::identity;
use crate::value::{date_from_value, is_present};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Planned,
    Actual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Boundary {
    Start,
    End,
}

/// Decode a planner column key into (stage label, kind, boundary)
fn parse_key(key: &str) -> Option<(&str, Kind, Boundary)> {
    let mut parts = key.split('.');
    let stage = parts.next()?.trim();
    let kind = parts.next()?.trim();
    let boundary = parts.next()?.trim();
    if parts.next().is_some() || stage.is_empty() {
        return None;
    }

    let kind = match kind.to_uppercase().as_str() {
        "PREV" => Kind::Planned,
        "REAL" => Kind::Actual,
        _ => return None,
    };
    let boundary = match boundary.to_uppercase().as_str() {
        "INÍCIO" | "INICIO" => Boundary::Start,
        "TÉRMINO" | "TERMINO" => Boundary::End,
        _ => return None,
    };
    Some((stage, kind, boundary))
}

/// Unpivot one planner row into per-stage records.
///
/// Stages whose four cells are all empty produce no record.
pub fn unpivot_row(obj: &Map<String, Value>) -> Vec<RawStageRecord> {
    let Some((project_id, org_unit)) = identity(obj) else {
        warn!("planner row without project skipped");
        return Vec::new();
    };

    let mut stages: BTreeMap<String, RawStageRecord> = BTreeMap::new();

    for (key, value) in obj {
        let Some((stage, kind, boundary)) = parse_key(key) else {
            continue;
        };
        if !is_present(value) {
            continue;
        }
        let Some(date) = date_from_value(value) else {
            warn!(project = %project_id, column = %key, value = %value, "malformed date treated as missing");
            continue;
        };

        let record = stages.entry(stage.to_string()).or_insert_with(|| {
            let mut record = RawStageRecord::new(project_id.clone(), stage);
            record.org_unit = org_unit.clone();
            record
        });
        match (kind, boundary) {
            (Kind::Planned, Boundary::Start) => record.planned_start = Some(date),
            (Kind::Planned, Boundary::End) => record.planned_end = Some(date),
            (Kind::Actual, Boundary::Start) => record.actual_start = Some(date),
            (Kind::Actual, Boundary::End) => record.actual_end = Some(date),
        }
    }

    debug!(project = %project_id, stages = stages.len(), "unpivoted planner row");
    stages.into_values().collect()
}
