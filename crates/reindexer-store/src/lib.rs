//! Store adapters for the reindexer.
//!
//! This crate provides:
//! - The view store adapter (Couchbase views over the view REST API)
//! - The search index adapter (Solr `select` handler)
//! - Blocking HTTP clients for both, behind the [`ViewClient`] and
//!   [`SearchClient`] traits so adapters can be driven by other transports
//!
//! Both adapters plug into `reindexer_core::Orchestrator` through their
//! connection parameter types, which implement `StoreTarget`.

#![deny(missing_docs)]

/// Error types for endpoint and view name parsing.
pub mod error;
/// Shared blocking HTTP helpers.
mod http;
/// Search index adapter.
pub mod search;
/// View store adapter.
pub mod view;

pub use error::{EndpointError, ViewNameError};
pub use search::{
    HttpSearchClient, SearchClient, SearchIndexAdapter, SearchIndexParams, SelectQuery,
    SelectResponse, SelectResults, ID_QUERY, MAX_ROWS,
};
pub use view::{
    missing_view_hint, view_endpoint, HttpViewClient, ViewClient, ViewName, ViewQuery,
    ViewResponse, ViewStoreAdapter, ViewStoreParams, MAP_FUNCTION_TEMPLATE,
};
