//! Dashboard configuration file
//!
//! An optional `stagetrack.toml` tunes the stage catalog, the business
//! calendar, the planning buffer and the layout. Every table may be
//! omitted; defaults reproduce the built-in behaviour.
//!
//! ```toml
//! [stages.aliases]
//! "ENG. EXECUTIVA" = "ENG"
//!
//! [calendar]
//! holidays = ["2024-12-25"]
//!
//! [buffer]
//! enabled = true
//! months = 2
//!
//! [buffer.stages]
//! DOC = "full"
//!
//! [layout]
//! month_width = 40.0
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use stagetrack_core::{BufferPolicy, BusinessCalendar, ShiftKind, StageCatalog, StageCode};
use stagetrack_render::LayoutConfig;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "stagetrack.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    /// Extra free-text label to stage code entries
    pub aliases: BTreeMap<String, StageCode>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub holidays: Vec<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub enabled: bool,
    pub months: i32,
    /// Overrides on top of the built-in stage classification
    pub stages: BTreeMap<StageCode, ShiftKind>,
    pub recompute_metrics: bool,
}

impl BufferConfig {
    pub fn policy(&self) -> BufferPolicy {
        let base = BufferPolicy {
            enabled: self.enabled,
            months: self.months,
            recompute_metrics: self.recompute_metrics,
            ..BufferPolicy::default()
        };
        self.stages
            .iter()
            .fold(base, |policy, (stage, kind)| policy.with_stage(*stage, *kind))
    }
}

/// Parsed `stagetrack.toml`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub stages: StagesConfig,
    pub calendar: CalendarConfig,
    pub buffer: BufferConfig,
    pub layout: LayoutConfig,
}

impl DashboardConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load an explicit config file, else `stagetrack.toml` in `dir` if
    /// present, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Built-in catalog extended with the configured aliases
    pub fn catalog(&self) -> StageCatalog {
        self.stages
            .aliases
            .iter()
            .fold(StageCatalog::standard(), |catalog, (label, code)| {
                catalog.with_alias(label, *code)
            })
    }

    pub fn calendar(&self) -> BusinessCalendar {
        BusinessCalendar::new().with_holidays(self.calendar.holidays.iter().copied())
    }
}
