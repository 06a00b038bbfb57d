use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backing store a row or target belongs to.
///
/// Ordering is significant: the orchestrator visits view stores before
/// search indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Document database queried through a materialized view.
    ViewStore,
    /// Full-text search index queried through its select API.
    SearchIndex,
}

impl SourceKind {
    /// Name of the row field carrying the identifier for this store.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::ViewStore => "value",
            Self::SearchIndex => "id",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewStore => write!(f, "view-store"),
            Self::SearchIndex => write!(f, "search-index"),
        }
    }
}

/// Store-agnostic description of one batch to fetch.
///
/// Built once per invocation and never mutated afterwards. `start_time` is
/// not checked against `end_time`; an inverted range is passed to the store
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Query the development variant of a view (view stores only).
    pub development_mode: bool,
    /// Maximum number of rows; `None` or `Some(0)` means no limit.
    pub limit: Option<u64>,
    /// Offset into the ordered result set.
    pub skip: u64,
    /// Lower time bound.
    pub start_time: Option<DateTime<Utc>>,
    /// Upper time bound.
    pub end_time: Option<DateTime<Utc>>,
    /// Prefix emitted in front of each identifier, separated by `:`.
    pub id_prefix: String,
    /// Drop the trailing version segment from view store identifiers.
    pub unversioned: bool,
}

impl QueryWindow {
    /// Row cap requested by the caller, with zero folded into "no limit".
    pub fn row_cap(&self) -> Option<u64> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Returns true if either time bound is set.
    pub fn has_time_range(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_means_unlimited() {
        let window = QueryWindow {
            limit: Some(0),
            ..QueryWindow::default()
        };
        assert_eq!(window.row_cap(), None);

        let window = QueryWindow {
            limit: Some(25),
            ..QueryWindow::default()
        };
        assert_eq!(window.row_cap(), Some(25));
    }

    #[test]
    fn view_store_sorts_before_search_index() {
        let mut kinds = vec![SourceKind::SearchIndex, SourceKind::ViewStore];
        kinds.sort();
        assert_eq!(kinds, vec![SourceKind::ViewStore, SourceKind::SearchIndex]);
    }

    #[test]
    fn id_field_per_store() {
        assert_eq!(SourceKind::ViewStore.id_field(), "value");
        assert_eq!(SourceKind::SearchIndex.id_field(), "id");
    }
}
