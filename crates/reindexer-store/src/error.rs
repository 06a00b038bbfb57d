use thiserror::Error;

/// A `design:view` identifier could not be split.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("view '{value}' must be in the format \"designdocname:viewname\"")]
pub struct ViewNameError {
    /// Offending value.
    pub value: String,
}

/// A store endpoint could not be turned into a URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Scheme is not one we know how to reach.
    #[error("unsupported endpoint '{0}': expected couchbase://, couchbases://, http:// or https://")]
    UnsupportedScheme(String),
    /// No host in the endpoint.
    #[error("endpoint '{0}' has no host")]
    MissingHost(String),
    /// The host already names a port.
    #[error("endpoint '{0}' must not include a port, the port is configured separately")]
    EmbeddedPort(String),
    /// URL parsing failed.
    #[error("invalid endpoint '{value}': {reason}")]
    Invalid {
        /// Offending value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Non-success HTTP answer, kept as the source of a store error.
#[derive(Error, Debug)]
pub(crate) enum HttpError {
    /// Credentials were rejected.
    #[error("authentication rejected with status {0}")]
    Auth(reqwest::StatusCode),
    /// Any other non-success status.
    #[error("status {status}: {body}")]
    Status {
        /// Status code.
        status: reqwest::StatusCode,
        /// Response body, trimmed.
        body: String,
    },
}
