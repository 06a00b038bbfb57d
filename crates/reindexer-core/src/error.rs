//! Error types for store and run failures.

use crate::normalize::RowShapeError;
use thiserror::Error;

/// Boxed transport error kept as the source of a [`StoreError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a store target. They fail that target only.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or refused our credentials.
    #[error("cannot connect to {endpoint}: {source}")]
    Connection {
        /// Endpoint that was contacted.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },
    /// The store rejected the query or answered with something unreadable.
    #[error("query failed: {message}")]
    Query {
        /// Description of the failure, including the store's own message.
        message: String,
        /// Operator hint for fixing the store side, if any.
        remediation: Option<String>,
        /// Underlying error.
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Creates a connection error.
    pub fn connection(endpoint: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    /// Creates a query error without a source.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            remediation: None,
            source: None,
        }
    }

    /// Creates a query error caused by `source`.
    pub fn query_caused_by(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Query {
            message: message.into(),
            remediation: None,
            source: Some(source.into()),
        }
    }

    /// Attaches a remediation hint to a query error. Connection errors are
    /// returned unchanged.
    pub fn with_remediation(self, hint: impl Into<String>) -> Self {
        match self {
            Self::Query {
                message, source, ..
            } => Self::Query {
                message,
                remediation: Some(hint.into()),
                source,
            },
            other => other,
        }
    }

    /// Remediation hint, if any.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Query { remediation, .. } => remediation.as_deref(),
            Self::Connection { .. } => None,
        }
    }
}

/// Errors that abort the whole run.
#[derive(Error, Debug)]
pub enum RunError {
    /// A store returned a row without its identifier field.
    #[error(transparent)]
    RowShape(#[from] RowShapeError),
    /// Identifiers could not be written to the output.
    #[error("failed to write identifiers: {0}")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remediation_only_sticks_to_query_errors() {
        let err = StoreError::query("view missing").with_remediation("create it");
        assert_eq!(err.remediation(), Some("create it"));
        assert_eq!(err.to_string(), "query failed: view missing");

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::connection("http://localhost:8092", io).with_remediation("ignored");
        assert_eq!(err.remediation(), None);
        assert!(err.to_string().contains("refused"));
    }
}
