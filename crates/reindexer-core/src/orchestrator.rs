//! Drives store targets one after another and streams their identifiers.
//!
//! View stores run before search indexes. A target that fails to connect or
//! whose query is rejected is reported and skipped; the remaining targets
//! still run. Row shape violations and output failures abort the run.

use crate::cursor::ResumeCursor;
use crate::error::{RunError, StoreError};
use crate::normalize::normalize;
use crate::traits::{RowPredicate, StoreTarget};
use crate::window::{QueryWindow, SourceKind};
use std::fmt;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Step of a target run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the store connection.
    Connect,
    /// Executing the windowed query.
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Result of running a single target.
#[derive(Debug)]
pub enum TargetOutcome {
    /// The row stream ended or was halted by the predicate.
    Completed {
        /// Rows written to the output.
        rows_consumed: u64,
        /// True if the predicate stopped the stream.
        halted: bool,
        /// Where the next batch starts; `None` for unlimited windows.
        resume: Option<ResumeCursor>,
    },
    /// The target failed before any identifier was written.
    Failed {
        /// Step that failed.
        stage: Stage,
        /// Error as reported by the store layer.
        error: StoreError,
    },
}

/// Report for one target.
#[derive(Debug)]
pub struct TargetReport {
    /// Store kind.
    pub kind: SourceKind,
    /// Endpoint the target points at.
    pub endpoint: String,
    /// What happened.
    pub outcome: TargetOutcome,
}

impl TargetReport {
    /// Rows written for this target, zero if it failed.
    pub fn rows_consumed(&self) -> u64 {
        match self.outcome {
            TargetOutcome::Completed { rows_consumed, .. } => rows_consumed,
            TargetOutcome::Failed { .. } => 0,
        }
    }

    /// Resume cursor, if the target completed with a limited window.
    pub fn resume(&self) -> Option<ResumeCursor> {
        match self.outcome {
            TargetOutcome::Completed { resume, .. } => resume,
            TargetOutcome::Failed { .. } => None,
        }
    }
}

/// Reports for every target, in the order they ran.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-target reports.
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    /// Returns true if no target failed.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Targets that failed.
    pub fn failures(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets
            .iter()
            .filter(|t| matches!(t.outcome, TargetOutcome::Failed { .. }))
    }
}

/// Runs a query window against a set of store targets.
pub struct Orchestrator<'a> {
    window: &'a QueryWindow,
    targets: Vec<&'a dyn StoreTarget>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator with no targets.
    pub fn new(window: &'a QueryWindow) -> Self {
        Self {
            window,
            targets: Vec::new(),
        }
    }

    /// Adds a target. Targets are reordered by kind when the run starts.
    pub fn with_target(mut self, target: &'a dyn StoreTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Streams every target's identifiers to `out`, one per line.
    pub fn run<W, P>(&self, out: &mut W, predicate: &mut P) -> Result<RunReport, RunError>
    where
        W: Write + ?Sized,
        P: RowPredicate + ?Sized,
    {
        let mut targets = self.targets.clone();
        targets.sort_by_key(|t| t.kind());

        let mut report = RunReport::default();
        for target in targets {
            let outcome = self.run_target(target, out, predicate)?;
            report.targets.push(TargetReport {
                kind: target.kind(),
                endpoint: target.endpoint(),
                outcome,
            });
        }
        Ok(report)
    }

    fn run_target<W, P>(
        &self,
        target: &dyn StoreTarget,
        out: &mut W,
        predicate: &mut P,
    ) -> Result<TargetOutcome, RunError>
    where
        W: Write + ?Sized,
        P: RowPredicate + ?Sized,
    {
        let kind = target.kind();
        let endpoint = target.endpoint();
        info!(store = %kind, endpoint = %endpoint, "connecting");

        let mut adapter = match target.connect() {
            Ok(adapter) => adapter,
            Err(e) => return Ok(failed(kind, &endpoint, Stage::Connect, e)),
        };
        debug!(store = %kind, range = ?kind.encode_range(self.window), "executing query");
        let rows = match adapter.execute(self.window) {
            Ok(rows) => rows,
            Err(e) => return Ok(failed(kind, &endpoint, Stage::Query, e)),
        };

        let cap = self.window.row_cap().unwrap_or(u64::MAX);
        let mut rows_consumed: u64 = 0;
        let mut halted = false;
        for row in rows {
            if rows_consumed >= cap {
                debug!(store = %kind, cap, "store returned more rows than requested");
                break;
            }
            let id = normalize(&row, self.window, kind)?;
            writeln!(out, "{}", id)?;
            rows_consumed += 1;
            if !predicate.proceed(&id) {
                halted = true;
                break;
            }
        }
        out.flush()?;

        info!(store = %kind, rows = rows_consumed, halted, "stream finished");
        let resume = ResumeCursor::after(self.window, rows_consumed);
        if let Some(cursor) = resume {
            info!(store = %kind, "{}", cursor);
        }

        Ok(TargetOutcome::Completed {
            rows_consumed,
            halted,
            resume,
        })
    }
}

fn failed(kind: SourceKind, endpoint: &str, stage: Stage, error: StoreError) -> TargetOutcome {
    error!(store = %kind, endpoint = %endpoint, "{} {} failed: {}", kind, stage, error);
    if let Some(hint) = error.remediation() {
        warn!(store = %kind, "{}", hint);
    }
    TargetOutcome::Failed { stage, error }
}
