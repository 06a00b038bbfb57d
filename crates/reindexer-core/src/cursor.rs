use crate::window::QueryWindow;
use std::fmt;

/// Offset the next batch should start from.
pub fn next_skip(skip: u64, rows_consumed: u64) -> u64 {
    skip.saturating_add(rows_consumed)
}

/// Resumption guidance printed after a limited batch.
///
/// Never persisted; the operator passes it back as `--skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeCursor {
    /// Skip value for the next run.
    pub next_skip: u64,
}

impl ResumeCursor {
    /// Cursor after consuming `rows_consumed` rows of `window`.
    ///
    /// Unlimited windows have no next batch and yield `None`.
    pub fn after(window: &QueryWindow, rows_consumed: u64) -> Option<Self> {
        window.row_cap().map(|_| Self {
            next_skip: next_skip(window.skip, rows_consumed),
        })
    }
}

impl fmt::Display for ResumeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "For next batch run with --skip={}", self.next_skip)
    }
}
