//! Row normalization: raw store rows in, identifier lines out.

use crate::window::{QueryWindow, SourceKind};
use serde_json::Value;
use thiserror::Error;

/// Raw result row as returned by a store adapter.
pub type RawRow = Value;

/// Width of the scheme marker every view store identifier starts with
/// (for example `onecms:`).
pub const SCHEME_MARKER_LEN: usize = 7;

/// A row did not carry the identifier field its store promises.
///
/// This means the data contract with the store has changed; it is never
/// recovered from.
#[derive(Error, Debug)]
#[error("{kind} row has no string `{field}` field: {row}")]
pub struct RowShapeError {
    /// Store the row came from.
    pub kind: SourceKind,
    /// Field that was expected.
    pub field: &'static str,
    /// The offending row, serialized.
    pub row: String,
}

/// Extracts the identifier from `row` and applies version stripping and
/// prefixing.
pub fn normalize(
    row: &RawRow,
    window: &QueryWindow,
    kind: SourceKind,
) -> Result<String, RowShapeError> {
    let field = kind.id_field();
    let raw = row
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| RowShapeError {
            kind,
            field,
            row: row.to_string(),
        })?;

    let id = match kind {
        SourceKind::ViewStore if window.unversioned => strip_version(raw),
        _ => raw,
    };

    Ok(if window.id_prefix.is_empty() {
        id.to_string()
    } else {
        format!("{}:{}", window.id_prefix, id)
    })
}

/// Drops the trailing version segment of a view store identifier.
///
/// The search for `:` starts after the scheme marker. Values without a
/// separator past the marker, or shorter than the marker, come back
/// unchanged.
pub fn strip_version(value: &str) -> &str {
    let Some(rest) = value.get(SCHEME_MARKER_LEN..) else {
        return value;
    };
    match rest.find(':') {
        Some(pos) if pos > 0 => &value[..SCHEME_MARKER_LEN + pos],
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window(prefix: &str, unversioned: bool) -> QueryWindow {
        QueryWindow {
            id_prefix: prefix.to_string(),
            unversioned,
            ..QueryWindow::default()
        }
    }

    #[test]
    fn view_row_keeps_version_by_default() {
        let row = json!({ "id": "HangerInfo::1", "value": "SCHEME1:abc:v3" });
        let id = normalize(&row, &window("", false), SourceKind::ViewStore).unwrap();
        assert_eq!(id, "SCHEME1:abc:v3");
    }

    #[test]
    fn view_row_drops_version_when_unversioned() {
        let row = json!({ "value": "onecms:4f1c-aa:0b7e" });
        let id = normalize(&row, &window("", true), SourceKind::ViewStore).unwrap();
        assert_eq!(id, "onecms:4f1c-aa");
    }

    #[test]
    fn separator_at_marker_is_not_a_version() {
        let row = json!({ "id": "HangerInfo::1", "value": "SCHEME1:abc:v3" });
        let id = normalize(&row, &window("", true), SourceKind::ViewStore).unwrap();
        assert_eq!(id, "SCHEME1:abc:v3");

        let id = normalize(&row, &window("mutation", true), SourceKind::ViewStore).unwrap();
        assert_eq!(id, "mutation:SCHEME1:abc:v3");
    }

    #[test]
    fn prefix_is_joined_with_colon() {
        let row = json!({ "value": "onecms:doc:v1" });
        let id = normalize(&row, &window("mutation", false), SourceKind::ViewStore).unwrap();
        assert_eq!(id, "mutation:onecms:doc:v1");

        let row = json!({ "id": "onecms:doc" });
        let id = normalize(&row, &window("deletion", false), SourceKind::SearchIndex).unwrap();
        assert_eq!(id, "deletion:onecms:doc");
    }

    #[test]
    fn search_row_is_verbatim_even_when_unversioned() {
        let row = json!({ "id": "onecms:doc:extra" });
        let id = normalize(&row, &window("", true), SourceKind::SearchIndex).unwrap();
        assert_eq!(id, "onecms:doc:extra");
    }

    #[test]
    fn strip_version_edge_cases() {
        assert_eq!(strip_version("short"), "short");
        assert_eq!(strip_version("onecms:noversion"), "onecms:noversion");
        assert_eq!(strip_version("onecms:a:b:c"), "onecms:a");
        // separator right at the marker boundary leaves an empty id segment
        assert_eq!(strip_version("SCHEME1::v3"), "SCHEME1::v3");
    }

    #[test]
    fn missing_field_is_shape_error() {
        let row = json!({ "id": "onecms:doc" });
        let err = normalize(&row, &window("", false), SourceKind::ViewStore).unwrap_err();
        assert_eq!(err.field, "value");
        assert_eq!(err.kind, SourceKind::ViewStore);

        let row = json!({ "id": 42 });
        assert!(normalize(&row, &window("", false), SourceKind::SearchIndex).is_err());
    }
}
