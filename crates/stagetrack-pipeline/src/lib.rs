//! # stagetrack-pipeline
//!
//! The pure record-to-evaluation pipeline of stagetrack.
//!
//! This crate provides:
//! - Record aggregation by (project, stage) (`aggregate`)
//! - The planned-date buffer shift (`buffer`)
//! - Project and stage ordering (`ordering`)
//! - The view dispatcher tying the steps together (`dispatch`)
//! - Flat export rows, project rollups and the wide pivot (`report`)
//!
//! Every function here is a pure function of its inputs; evaluating the
//! same records under the same view and "today" always yields the same
//! result.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use stagetrack_core::{RawStageRecord, StatusCategory, ViewState};
//! use stagetrack_pipeline::ViewDispatcher;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
//! let records = vec![RawStageRecord::new("Alpha", "DM")
//!     .planned(d(2, 1), d(2, 28))
//!     .actual(d(2, 5), d(3, 2))
//!     .completion(100.0)];
//!
//! let evaluation = ViewDispatcher::default().evaluate(&records, &ViewState::new(), d(6, 1));
//! assert_eq!(evaluation.entries[0].status, StatusCategory::LateComplete);
//! ```

pub mod aggregate;
pub mod buffer;
pub mod dispatch;
pub mod ordering;
pub mod report;

pub use aggregate::aggregate;
pub use buffer::{apply_buffer, apply_policy};
pub use dispatch::{Evaluation, ViewDispatcher};
pub use ordering::{order, order_by, ReferenceDate};
pub use report::{ExportRow, Pivot, PivotCell, PivotRow, ProjectRollup, Report, ReportSort, SortKey};
