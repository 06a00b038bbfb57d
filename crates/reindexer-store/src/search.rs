//! Search index adapter over the Solr `select` handler.

use crate::error::EndpointError;
use crate::http;
use reindexer_core::{
    QueryRange, QueryWindow, RawRow, RowStream, SourceKind, StoreAdapter, StoreError,
    StoreTarget,
};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Query matching every identifier of the `onecms` namespace.
pub const ID_QUERY: &str = "id:onecms*";
/// Row count requested when the window has no limit. The index rejects
/// `start` or `rows` above a signed 32-bit value, so both are clamped to it.
pub const MAX_ROWS: u64 = i32::MAX as u64;
/// Field holding the last modification time of a document.
pub const MODIFICATION_TIME_FIELD: &str = "modificationTime";
/// Default port of the search index.
pub const DEFAULT_PORT: u16 = 8983;
/// Default index (core) name.
pub const DEFAULT_INDEX: &str = "onecms";

/// Select query built from a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Main query string.
    pub q: String,
    /// Offset of the first row.
    pub start: u64,
    /// Number of rows to return.
    pub rows: u64,
    /// Filter query on the modification time, if the window has bounds.
    pub filter: Option<String>,
}

impl SelectQuery {
    /// Builds the select query for `q` over `window`.
    pub fn new(q: &str, window: &QueryWindow) -> Self {
        Self {
            q: q.to_string(),
            start: window.skip.min(MAX_ROWS),
            rows: window.row_cap().unwrap_or(MAX_ROWS).min(MAX_ROWS),
            filter: SourceKind::SearchIndex
                .encode_range(window)
                .and_then(QueryRange::into_timestamps)
                .map(|range| range.to_filter(MODIFICATION_TIME_FIELD)),
        }
    }

    /// Query string parameters, in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q.clone()),
            ("start", self.start.to_string()),
            ("rows", self.rows.to_string()),
        ];
        if let Some(filter) = &self.filter {
            params.push(("fq", filter.clone()));
        }
        params.push(("wt", "json".to_string()));
        params
    }
}

/// Body of a select answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectResponse {
    /// Matching documents.
    pub response: SelectResults,
}

/// Result section of a select answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectResults {
    /// Total number of matches, regardless of pagination.
    #[serde(rename = "numFound")]
    pub num_found: u64,
    /// Offset of the first returned document.
    #[serde(default)]
    pub start: u64,
    /// Documents of this page.
    #[serde(default)]
    pub docs: Vec<RawRow>,
}

/// Executes select queries.
pub trait SearchClient {
    /// Runs `query` and returns the decoded answer.
    fn select(&self, query: &SelectQuery) -> Result<SelectResponse, StoreError>;
}

/// Connection parameters of a search index target.
#[derive(Debug, Clone)]
pub struct SearchIndexParams {
    /// Base URL of the search server.
    pub endpoint: Url,
    /// Index (core) name.
    pub index: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl SearchIndexParams {
    /// Builds parameters for `host`, `port` and `index`.
    ///
    /// `host` is a bare host name or a `scheme://host` URL. It must not carry
    /// a port of its own; the port always comes from `port`.
    pub fn new(
        host: &str,
        port: u16,
        index: &str,
        timeout: Duration,
    ) -> Result<Self, EndpointError> {
        if host.is_empty() {
            return Err(EndpointError::MissingHost(host.to_string()));
        }
        let raw = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        let invalid = |reason: String| EndpointError::Invalid {
            value: host.to_string(),
            reason,
        };
        let mut endpoint = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::MissingHost(host.to_string()));
        }
        if endpoint.port().is_some() {
            return Err(EndpointError::EmbeddedPort(host.to_string()));
        }
        endpoint
            .set_port(Some(port))
            .map_err(|_| invalid(format!("cannot use port {}", port)))?;
        endpoint.set_path("/");
        endpoint.set_query(None);
        Ok(Self {
            endpoint,
            index: index.to_string(),
            timeout,
        })
    }

    /// URL of the index's select handler.
    pub fn select_url(&self) -> Result<Url, StoreError> {
        self.handler_url(&["select"])
    }

    /// URL of the index's ping handler.
    pub fn ping_url(&self) -> Result<Url, StoreError> {
        self.handler_url(&["admin", "ping"])
    }

    fn handler_url(&self, handler: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::connection(self.endpoint.as_str(), "not a base URL"))?
            .pop_if_empty()
            .extend(["solr", self.index.as_str()])
            .extend(handler);
        Ok(url)
    }
}

impl StoreTarget for SearchIndexParams {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchIndex
    }

    fn endpoint(&self) -> String {
        format!("{}solr/{}", self.endpoint, self.index)
    }

    fn connect(&self) -> Result<Box<dyn StoreAdapter + '_>, StoreError> {
        let client = HttpSearchClient::new(self)?;
        client.ping()?;
        info!(index = %self.index, "connected to {}", self.endpoint());
        Ok(Box::new(SearchIndexAdapter::new(client)))
    }
}

/// Blocking HTTP select client.
#[derive(Debug)]
pub struct HttpSearchClient {
    http: Client,
    select_url: Url,
    ping_url: Url,
}

impl HttpSearchClient {
    /// Creates a client for `params`.
    pub fn new(params: &SearchIndexParams) -> Result<Self, StoreError> {
        Ok(Self {
            http: http::build_client(params.endpoint.as_str(), params.timeout)?,
            select_url: params.select_url()?,
            ping_url: params.ping_url()?,
        })
    }

    /// Checks that the index answers its ping handler.
    pub fn ping(&self) -> Result<(), StoreError> {
        debug!(url = %self.ping_url, "ping request");
        http::probe(self.http.get(self.ping_url.clone()), self.select_url.as_str())
    }

    /// Full URL of `query`.
    pub fn url(&self, query: &SelectQuery) -> Url {
        let mut url = self.select_url.clone();
        url.query_pairs_mut().extend_pairs(query.params());
        url
    }
}

impl SearchClient for HttpSearchClient {
    fn select(&self, query: &SelectQuery) -> Result<SelectResponse, StoreError> {
        let url = self.url(query);
        debug!(%url, "select request");
        let response = http::send(self.http.get(url), self.select_url.as_str())?;
        http::read_json(response)
    }
}

/// Adapter running windowed queries against the search index.
#[derive(Debug)]
pub struct SearchIndexAdapter<C> {
    client: C,
}

impl<C: SearchClient> SearchIndexAdapter<C> {
    /// Creates an adapter using `client`.
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: SearchClient> StoreAdapter for SearchIndexAdapter<C> {
    fn execute(&mut self, window: &QueryWindow) -> Result<RowStream<'_>, StoreError> {
        let query = SelectQuery::new(ID_QUERY, window);
        let response = self.client.select(&query)?.response;
        info!(found = response.num_found, "found {} results", response.num_found);
        Ok(Box::new(response.docs.into_iter()))
    }
}
