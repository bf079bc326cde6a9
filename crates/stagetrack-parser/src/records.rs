//! Long-format record objects
//!
//! One JSON object per (project, stage) observation:
//!
//! ```json
//! {
//!   "module": "UGB1 | Residencial Alfa",
//!   "stage": "Planejamento",
//!   "planned_start": "01/02/2024",
//!   "planned_end": "2024-02-28",
//!   "completion": "85%"
//! }
//! ```

use serde_json::{Map, Value};
use tracing::warn;

use stagetrack_core::RawStageRecord;

use crate::value::{date_from_value, is_present, percent_from_value, text_from_value};

const PROJECT_KEYS: &[&str] = &["project", "project_id", "Empreendimento", "empreendimento", "EMP", "Emp"];
const ORG_UNIT_KEYS: &[&str] = &["org_unit", "UGB", "ugb"];
const MODULE_KEYS: &[&str] = &["module", "Módulo", "MÓDULO", "modulo"];
const STAGE_KEYS: &[&str] = &["stage", "stage_label", "Etapa", "etapa", "Atividade", "atividade"];
const COMPLETION_KEYS: &[&str] = &["completion", "completion_pct", "% concluído", "% concluido"];

// Smartsheet exports name the actual window `Iniciar`/`Terminar`
const PLANNED_START_KEYS: &[&str] = &["planned_start", "Inicio_Prevista"];
const PLANNED_END_KEYS: &[&str] = &["planned_end", "Termino_Prevista"];
const ACTUAL_START_KEYS: &[&str] = &["actual_start", "Inicio_Real", "Iniciar"];
const ACTUAL_END_KEYS: &[&str] = &["actual_end", "Termino_Real", "Terminar"];

/// First present value among a list of alternative keys
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| is_present(value))
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys).and_then(text_from_value)
}

/// Split a combined `"ORG | PROJECT"` module field.
///
/// Without a separator the whole text is the project.
pub fn split_module(module: &str) -> (Option<String>, String) {
    match module.split_once('|') {
        Some((org, project)) => {
            let org = org.trim();
            let org = (!org.is_empty()).then(|| org.to_string());
            (org, project.trim().to_string())
        }
        None => (None, module.trim().to_string()),
    }
}

/// Project and org unit of a row, from explicit fields or the module field
pub(crate) fn identity(obj: &Map<String, Value>) -> Option<(String, Option<String>)> {
    let mut project = text_field(obj, PROJECT_KEYS);
    let mut org_unit = text_field(obj, ORG_UNIT_KEYS);

    if project.is_none() || org_unit.is_none() {
        if let Some(module) = text_field(obj, MODULE_KEYS) {
            let (module_org, module_project) = split_module(&module);
            if project.is_none() && !module_project.is_empty() {
                project = Some(module_project);
            }
            if org_unit.is_none() {
                org_unit = module_org;
            }
        }
    }

    project.map(|p| (p, org_unit))
}

/// Date field under any of its alias keys, warning when a value is
/// present but unparseable
fn date_field(obj: &Map<String, Value>, keys: &[&str], project: &str) -> Option<chrono::NaiveDate> {
    let value = field(obj, keys)?;
    let parsed = date_from_value(value);
    if parsed.is_none() {
        warn!(project, field = keys[0], value = %value, "malformed date treated as missing");
    }
    parsed
}

/// Convert one long-format object into a record.
///
/// Returns `None` (with a warning) when the object has no project.
pub fn record_from_object(obj: &Map<String, Value>) -> Option<RawStageRecord> {
    let Some((project_id, org_unit)) = identity(obj) else {
        warn!("record without project skipped");
        return None;
    };

    let completion = field(obj, COMPLETION_KEYS).and_then(|value| {
        let parsed = percent_from_value(value);
        if parsed.is_none() {
            warn!(project = %project_id, value = %value, "malformed percentage treated as missing");
        }
        parsed
    });

    Some(RawStageRecord {
        org_unit,
        stage_label: text_field(obj, STAGE_KEYS),
        planned_start: date_field(obj, PLANNED_START_KEYS, &project_id),
        planned_end: date_field(obj, PLANNED_END_KEYS, &project_id),
        actual_start: date_field(obj, ACTUAL_START_KEYS, &project_id),
        actual_end: date_field(obj, ACTUAL_END_KEYS, &project_id),
        completion,
        project_id,
    })
}
