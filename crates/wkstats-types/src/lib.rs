//! Shared value types for WaniKani SRS statistics tracking.
//!
//! This crate provides the data model used across the workspace:
//!
//! - [`SrsStage`] and [`StageTotals`] for per-stage item counts
//! - [`Snapshot`] for one day's observation
//! - [`History`] for the persisted time series
//! - [`DeltaView`] for the derived day-over-day differences
//!
//! All types are plain values: no I/O happens here. Fetching lives in
//! wkstats-client, persistence in wkstats-store.
//!
//! # Example
//!
//! ```
//! use wkstats_types::{History, DeltaView};
//!
//! let history = History::default();
//! let view = DeltaView::from_history(&history);
//! assert!(view.is_empty());
//! ```

pub mod delta;
pub mod types;

pub use delta::{DeltaRow, DeltaView, StageDelta};
pub use types::{History, Snapshot, SrsStage, StageTotals};
