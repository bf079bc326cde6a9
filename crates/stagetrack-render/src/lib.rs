//! # stagetrack-render
//!
//! Timeline layout and rendering for stagetrack.
//!
//! This crate provides:
//! - The timeline layout engine: chart range, bar positions, overlap regions
//! - A status colour palette and legend for rendering surfaces
//! - A fixed-width text renderer for terminals
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use stagetrack_core::{RawStageRecord, Renderer, ViewState};
//! use stagetrack_pipeline::ViewDispatcher;
//! use stagetrack_render::{LayoutEngine, TextRenderer};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
//! let records = vec![RawStageRecord::new("Alpha", "DM")
//!     .planned(d(2, 1), d(2, 28))
//!     .actual(d(2, 5), d(3, 2))
//!     .completion(100.0)];
//!
//! let view = ViewState::new();
//! let dispatcher = ViewDispatcher::default();
//! let evaluation = dispatcher.evaluate(&records, &view, d(6, 1));
//! let timeline = LayoutEngine::default().layout(&evaluation.entries, &view, dispatcher.catalog(), d(6, 1));
//!
//! assert_eq!(timeline.lanes.len(), 1);
//! let text = TextRenderer::new().render(&timeline).unwrap();
//! assert!(text.contains("Alpha"));
//! ```

pub mod layout;
pub mod palette;
pub mod text;

pub use layout::{position, LayoutConfig, LayoutEngine, Span};
pub use palette::{LegendEntry, StatusPalette};
pub use text::TextRenderer;
