//! Store target and adapter traits.

use crate::error::StoreError;
use crate::normalize::RawRow;
use crate::window::{QueryWindow, SourceKind};

/// Lazy sequence of raw rows for one executed query.
pub type RowStream<'a> = Box<dyn Iterator<Item = RawRow> + 'a>;

/// A configured store the orchestrator can connect to.
pub trait StoreTarget {
    /// Kind of store behind this target.
    fn kind(&self) -> SourceKind;

    /// Human-readable endpoint, used in diagnostics.
    fn endpoint(&self) -> String;

    /// Opens a connection and returns an adapter ready to execute queries.
    fn connect(&self) -> Result<Box<dyn StoreAdapter + '_>, StoreError>;
}

/// Executes a windowed query against one store.
pub trait StoreAdapter {
    /// Translates `window` into the store's query and runs it.
    fn execute(&mut self, window: &QueryWindow) -> Result<RowStream<'_>, StoreError>;
}

/// Per-row early-stop capability.
///
/// Called after each identifier has been written; returning `false` halts
/// the current target with that row counted as consumed.
pub trait RowPredicate {
    /// Returns true to keep streaming.
    fn proceed(&mut self, identifier: &str) -> bool;
}

impl<F> RowPredicate for F
where
    F: FnMut(&str) -> bool,
{
    fn proceed(&mut self, identifier: &str) -> bool {
        self(identifier)
    }
}

