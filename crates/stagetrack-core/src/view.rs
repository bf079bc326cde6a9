//! View state
//!
//! [`ViewState`] is the only value mutated by user interaction. Every other
//! entity (intervals, statuses, lanes) is re-derived from it plus the raw
//! record set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{OrgUnitId, ProjectId, StageCode};

/// Lane assignment mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// One lane per (project, stage)
    #[default]
    PerProject,
    /// One lane per project, for a single stage
    Consolidated,
}

/// Which bars are emitted per lane
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationMode {
    Planned,
    Actual,
    #[default]
    Both,
}

impl VisualizationMode {
    pub fn shows_planned(&self) -> bool {
        matches!(self, VisualizationMode::Planned | VisualizationMode::Both)
    }

    pub fn shows_actual(&self) -> bool {
        matches!(self, VisualizationMode::Actual | VisualizationMode::Both)
    }
}

impl std::str::FromStr for VisualizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" | "plan" => Ok(VisualizationMode::Planned),
            "actual" | "real" => Ok(VisualizationMode::Actual),
            "both" | "all" => Ok(VisualizationMode::Both),
            other => Err(format!(
                "unknown visualization mode '{}' (expected planned, actual or both)",
                other
            )),
        }
    }
}

/// Record filters.
///
/// `None` means "match all". An explicitly empty org-unit set matches
/// nothing; an empty project set is treated as unset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilters {
    pub org_units: Option<BTreeSet<OrgUnitId>>,
    pub projects: Option<BTreeSet<ProjectId>>,
    /// Drop intervals that are 100% complete
    pub hide_complete: bool,
}

impl ViewFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a set of org units
    pub fn org_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.org_units = Some(units.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to a set of projects
    pub fn projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = Some(projects.into_iter().map(Into::into).collect());
        self
    }

    pub fn hide_complete(mut self, hide: bool) -> Self {
        self.hide_complete = hide;
        self
    }

    /// Org-unit predicate. Records without an org unit only pass when
    /// the filter is unset.
    pub fn matches_org_unit(&self, org_unit: Option<&str>) -> bool {
        match &self.org_units {
            None => true,
            Some(set) => org_unit.is_some_and(|unit| set.contains(unit)),
        }
    }

    /// Project predicate
    pub fn matches_project(&self, project_id: &str) -> bool {
        match &self.projects {
            Some(set) if !set.is_empty() => set.contains(project_id),
            _ => true,
        }
    }
}

/// How the buffer moves a stage's planned dates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftKind {
    /// Planned dates untouched
    #[default]
    #[serde(rename = "none")]
    NoShift,
    /// Only the planned start moves
    #[serde(rename = "start")]
    StartOnly,
    /// Planned start and end both move
    #[serde(rename = "full")]
    FullShift,
}

impl ShiftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::NoShift => "none",
            ShiftKind::StartOnly => "start",
            ShiftKind::FullShift => "full",
        }
    }
}

/// Month-offset applied to planned dates for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPolicy {
    pub enabled: bool,
    /// Offset in calendar months (may be negative)
    pub months: i32,
    /// Shift kind per stage; stages not listed do not shift
    pub stages: BTreeMap<StageCode, ShiftKind>,
    /// Compute variance and status on the shifted copy instead of the
    /// original intervals
    pub recompute_metrics: bool,
}

impl Default for BufferPolicy {
    fn default() -> Self {
        let stages = [
            (StageCode::Dm, ShiftKind::NoShift),
            (StageCode::Doc, ShiftKind::StartOnly),
            (StageCode::Eng, ShiftKind::FullShift),
            (StageCode::Mem, ShiftKind::FullShift),
            (StageCode::Lae, ShiftKind::FullShift),
            (StageCode::Cont, ShiftKind::FullShift),
            (StageCode::Ass, ShiftKind::FullShift),
        ]
        .into_iter()
        .collect();

        Self {
            enabled: false,
            months: 0,
            stages,
            recompute_metrics: false,
        }
    }
}

impl BufferPolicy {
    /// An enabled buffer of `months` with the default stage classification
    pub fn months(months: i32) -> Self {
        Self {
            enabled: true,
            months,
            ..Self::default()
        }
    }

    /// Override the shift kind of one stage
    pub fn with_stage(mut self, stage: StageCode, kind: ShiftKind) -> Self {
        self.stages.insert(stage, kind);
        self
    }

    pub fn shift_kind(&self, stage: StageCode) -> ShiftKind {
        self.stages.get(&stage).copied().unwrap_or_default()
    }

    /// Whether applying the policy can change anything
    pub fn is_active(&self) -> bool {
        self.enabled && self.months != 0
    }
}

/// Everything a user can change about the view
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// `Some(stage)` selects consolidated mode for that stage
    pub active_stage: Option<StageCode>,
    pub filters: ViewFilters,
    pub visualization: VisualizationMode,
    pub buffer: BufferPolicy,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        if self.active_stage.is_some() {
            ViewMode::Consolidated
        } else {
            ViewMode::PerProject
        }
    }

    pub fn stage(mut self, stage: StageCode) -> Self {
        self.active_stage = Some(stage);
        self
    }

    pub fn filters(mut self, filters: ViewFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn visualization(mut self, mode: VisualizationMode) -> Self {
        self.visualization = mode;
        self
    }

    pub fn buffer(mut self, buffer: BufferPolicy) -> Self {
        self.buffer = buffer;
        self
    }
}
