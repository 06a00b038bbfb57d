//! Each store indexes time differently, so ranges are encoded per store:
//! view stores emit `[year, month, day]` keys (day resolution), search
//! indexes store full timestamps.

use crate::window::{QueryWindow, SourceKind};
use chrono::{DateTime, Datelike, Utc};

/// `[year, month, day]` index key.
pub type DayKey = [i32; 3];

/// Wildcard lower bound of a search index range.
pub const EARLIEST: &str = "*";
/// Upper bound of a search index range when no end time is given.
pub const NOW: &str = "NOW";
/// Timestamp layout understood by the search index.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Range over date-component view keys, inclusive on both ends.
///
/// An unset bound leaves that side of the range open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayKeyRange {
    /// Start key.
    pub start: Option<DayKey>,
    /// End key.
    pub end: Option<DayKey>,
}

impl DayKeyRange {
    /// Builds the range for a window, or `None` when no bound is set.
    pub fn from_window(window: &QueryWindow) -> Option<Self> {
        if !window.has_time_range() {
            return None;
        }
        Some(Self {
            start: window.start_time.as_ref().map(day_key),
            end: window.end_time.as_ref().map(day_key),
        })
    }

    /// The end key is always part of the range.
    pub fn inclusive_end(&self) -> bool {
        true
    }
}

/// Range over a timestamp field, rendered as `[start TO end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRange {
    /// Formatted start bound or [`EARLIEST`].
    pub start: String,
    /// Formatted end bound or [`NOW`].
    pub end: String,
}

impl TimestampRange {
    /// Builds the range for a window, or `None` when no bound is set.
    ///
    /// Each bound comes from its own side of the window; a missing end
    /// falls back to [`NOW`], never to the start time.
    pub fn from_window(window: &QueryWindow) -> Option<Self> {
        if !window.has_time_range() {
            return None;
        }
        Some(Self {
            start: window
                .start_time
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| EARLIEST.to_string()),
            end: window
                .end_time
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| NOW.to_string()),
        })
    }

    /// Renders a filter clause on `field`.
    pub fn to_filter(&self, field: &str) -> String {
        format!("{}:[{} TO {}]", field, self.start, self.end)
    }
}

/// Range encoding chosen by the store kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRange {
    /// View store date-array keys.
    DayKeys(DayKeyRange),
    /// Search index timestamps.
    Timestamps(TimestampRange),
}

impl QueryRange {
    /// The day-key range, if this is one.
    pub fn into_day_keys(self) -> Option<DayKeyRange> {
        match self {
            Self::DayKeys(range) => Some(range),
            Self::Timestamps(_) => None,
        }
    }

    /// The timestamp range, if this is one.
    pub fn into_timestamps(self) -> Option<TimestampRange> {
        match self {
            Self::Timestamps(range) => Some(range),
            Self::DayKeys(_) => None,
        }
    }
}

impl SourceKind {
    /// Encodes the window's time bounds the way this store expects them.
    pub fn encode_range(self, window: &QueryWindow) -> Option<QueryRange> {
        match self {
            Self::ViewStore => DayKeyRange::from_window(window).map(QueryRange::DayKeys),
            Self::SearchIndex => TimestampRange::from_window(window).map(QueryRange::Timestamps),
        }
    }
}

fn day_key(time: &DateTime<Utc>) -> DayKey {
    [time.year(), time.month() as i32, time.day() as i32]
}
