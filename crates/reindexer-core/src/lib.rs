//! Query windowing and result normalization for the reindexer.
//!
//! This crate provides:
//! - [`QueryWindow`], the store-agnostic description of one batch
//! - Store-specific range encodings ([`QueryRange`]) selected by [`SourceKind`]
//! - The row normalizer turning raw store rows into identifiers
//! - Resume cursor arithmetic for the next batch
//! - The [`Orchestrator`] driving store targets and streaming identifiers
//!
//! Store clients live behind the [`StoreTarget`] and [`StoreAdapter`] traits;
//! this crate performs no I/O of its own beyond writing to the output sink.

#![deny(missing_docs)]

/// Resume cursor arithmetic.
pub mod cursor;
/// Error types for store and run failures.
pub mod error;
/// Row normalization.
pub mod normalize;
/// Orchestration of store targets.
pub mod orchestrator;
/// Store-specific range encodings.
pub mod range;
/// Store target and adapter traits.
pub mod traits;
/// Query window parameters.
pub mod window;

pub use cursor::{next_skip, ResumeCursor};
pub use error::{BoxError, RunError, StoreError};
pub use normalize::{normalize, strip_version, RawRow, RowShapeError, SCHEME_MARKER_LEN};
pub use orchestrator::{Orchestrator, RunReport, Stage, TargetOutcome, TargetReport};
pub use range::{DayKey, DayKeyRange, QueryRange, TimestampRange};
pub use traits::{RowPredicate, RowStream, StoreAdapter, StoreTarget};
pub use window::{QueryWindow, SourceKind};
