//! View store adapter.
//!
//! Queries a view of a design document through the view REST API:
//! `GET /{bucket}/_design/{design}/_view/{view}`. The view is expected to
//! emit `[year, month, day]` keys and version-stamped identifiers as values
//! (see [`MAP_FUNCTION_TEMPLATE`]).

use crate::error::{EndpointError, ViewNameError};
use crate::http;
use reindexer_core::{
    DayKey, DayKeyRange, QueryRange, QueryWindow, RawRow, RowStream, SourceKind, StoreAdapter,
    StoreError, StoreTarget,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix of development design documents.
pub const DEV_DESIGN_PREFIX: &str = "dev_";
/// Port of the view REST API.
pub const VIEW_PORT: u16 = 8092;
/// Port of the view REST API over TLS.
pub const VIEW_TLS_PORT: u16 = 18092;

/// Map function the reindexer view is expected to run.
pub const MAP_FUNCTION_TEMPLATE: &str = r#"function (doc, meta) {
  if (meta.id.indexOf('HangerInfo::') == 0) {
    if (doc.versions && doc.versions.length > 0) {
      var lastVersion = doc.versions[doc.versions.length - 1];
      var ts = dateToArray(lastVersion.creationInfo.timestamp).slice(0, 3);
      emit(ts, lastVersion.version);
    }
  }
}"#;

/// Remediation attached to failed view queries.
pub fn missing_view_hint() -> String {
    format!(
        "if the view does not exist you can create it with\n{}",
        MAP_FUNCTION_TEMPLATE
    )
}

/// A view inside a design document, written `design:view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewName {
    design: String,
    view: String,
}

impl ViewName {
    /// Splits `design:view` on the first `:`. Both halves must be non-empty.
    pub fn parse(value: &str) -> Result<Self, ViewNameError> {
        match value.split_once(':') {
            Some((design, view)) if !design.is_empty() && !view.is_empty() => Ok(Self {
                design: design.to_string(),
                view: view.to_string(),
            }),
            _ => Err(ViewNameError {
                value: value.to_string(),
            }),
        }
    }

    /// Design document name.
    pub fn design(&self) -> &str {
        &self.design
    }

    /// View name.
    pub fn view(&self) -> &str {
        &self.view
    }
}

impl FromStr for ViewName {
    type Err = ViewNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.design, self.view)
    }
}

/// Turns a view store URI into the base URL of its view REST API.
///
/// `couchbase://host` maps to `http://host:8092/` and `couchbases://host` to
/// `https://host:18092/`; only the first host of a list is used and any port
/// in the URI is replaced. `http(s)://` URLs are taken as they are.
pub fn view_endpoint(uri: &str) -> Result<Url, EndpointError> {
    let (scheme, rest, port) = if let Some(rest) = uri.strip_prefix("couchbase://") {
        ("http", rest, VIEW_PORT)
    } else if let Some(rest) = uri.strip_prefix("couchbases://") {
        ("https", rest, VIEW_TLS_PORT)
    } else if uri.starts_with("http://") || uri.starts_with("https://") {
        return parse_url(uri);
    } else {
        return Err(EndpointError::UnsupportedScheme(uri.to_string()));
    };

    let host = rest
        .split(|c: char| c == '/' || c == '?')
        .next()
        .and_then(|hosts| hosts.split(',').next())
        .and_then(|host| host.split(':').next())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(EndpointError::MissingHost(uri.to_string()));
    }
    parse_url(&format!("{}://{}:{}/", scheme, host, port))
}

fn parse_url(value: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(value).map_err(|e| EndpointError::Invalid {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(EndpointError::MissingHost(value.to_string()));
    }
    Ok(url)
}

/// View query built from a window.
///
/// Always waits for the index to catch up (`stale=false`) and reads in
/// ascending key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    /// Design document name, without the development prefix.
    pub design: String,
    /// View name.
    pub view: String,
    /// Query the development design document.
    pub development: bool,
    /// Row cap, if any.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub skip: u64,
    /// Key range, if the window has time bounds.
    pub range: Option<DayKeyRange>,
}

impl ViewQuery {
    /// Builds the query for `name` over `window`.
    pub fn new(name: &ViewName, window: &QueryWindow) -> Self {
        Self {
            design: name.design().to_string(),
            view: name.view().to_string(),
            development: window.development_mode,
            limit: window.row_cap(),
            skip: window.skip,
            range: SourceKind::ViewStore
                .encode_range(window)
                .and_then(QueryRange::into_day_keys),
        }
    }

    /// Design document as addressed on the wire.
    pub fn design_document(&self) -> String {
        if self.development {
            format!("{}{}", DEV_DESIGN_PREFIX, self.design)
        } else {
            self.design.clone()
        }
    }

    /// Query string parameters, in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("stale", "false".to_string()),
            ("descending", "false".to_string()),
        ];
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params.push(("skip", self.skip.to_string()));
        if let Some(range) = &self.range {
            if let Some(start) = range.start {
                params.push(("startkey", key_json(start)));
            }
            if let Some(end) = range.end {
                params.push(("endkey", key_json(end)));
            }
            params.push(("inclusive_end", range.inclusive_end().to_string()));
        }
        params
    }
}

fn key_json(key: DayKey) -> String {
    format!("[{},{},{}]", key[0], key[1], key[2])
}

/// Body of a view query answer.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewResponse {
    /// Rows in the whole view, when the store reports it.
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Rows of this page.
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// Executes view queries.
pub trait ViewClient {
    /// Runs `query` and returns the decoded answer.
    fn query(&self, query: &ViewQuery) -> Result<ViewResponse, StoreError>;
}

/// Connection parameters of a view store target.
#[derive(Debug, Clone)]
pub struct ViewStoreParams {
    /// Base URL of the view REST API.
    pub endpoint: Url,
    /// Bucket holding the design document.
    pub bucket: String,
    /// Bucket password, sent as basic auth.
    pub password: Option<String>,
    /// View to query.
    pub view: ViewName,
    /// Request timeout.
    pub timeout: Duration,
}

impl StoreTarget for ViewStoreParams {
    fn kind(&self) -> SourceKind {
        SourceKind::ViewStore
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }

    fn connect(&self) -> Result<Box<dyn StoreAdapter + '_>, StoreError> {
        let client = HttpViewClient::new(self)?;
        client.ping()?;
        info!(bucket = %self.bucket, "connected to bucket {}", self.bucket);
        Ok(Box::new(ViewStoreAdapter::new(client, self.view.clone())))
    }
}

/// Blocking HTTP view client.
#[derive(Debug)]
pub struct HttpViewClient {
    http: Client,
    base: Url,
    bucket: String,
    password: Option<String>,
}

impl HttpViewClient {
    /// Creates a client for `params`.
    pub fn new(params: &ViewStoreParams) -> Result<Self, StoreError> {
        Ok(Self {
            http: http::build_client(params.endpoint.as_str(), params.timeout)?,
            base: params.endpoint.clone(),
            bucket: params.bucket.clone(),
            password: params.password.clone(),
        })
    }

    /// Opens the bucket: `GET /{bucket}`. Fails with a connection error if
    /// the store is unreachable, rejects the credentials or has no such
    /// bucket.
    pub fn ping(&self) -> Result<(), StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::connection(self.base.as_str(), "not a base URL"))?
            .pop_if_empty()
            .push(&self.bucket);
        debug!(%url, "bucket request");
        http::probe(self.authorized(self.http.get(url)), self.base.as_str())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.password {
            Some(password) => request.basic_auth(&self.bucket, Some(password)),
            None => request,
        }
    }

    /// Full URL of `query`.
    pub fn url(&self, query: &ViewQuery) -> Result<Url, StoreError> {
        let design = query.design_document();
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::query(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend([
                self.bucket.as_str(),
                "_design",
                design.as_str(),
                "_view",
                query.view.as_str(),
            ]);
        url.query_pairs_mut().extend_pairs(query.params());
        Ok(url)
    }
}

impl ViewClient for HttpViewClient {
    fn query(&self, query: &ViewQuery) -> Result<ViewResponse, StoreError> {
        let url = self.url(query)?;
        debug!(%url, "view request");

        let response = http::send(self.authorized(self.http.get(url)), self.base.as_str())?;
        if response.status() == StatusCode::NOT_FOUND {
            let body = http::body_text(response);
            return Err(StoreError::query(format!(
                "view {}/{} not found in bucket {}: {}",
                query.design_document(),
                query.view,
                self.bucket,
                body
            )));
        }
        http::read_json(response)
    }
}

/// Adapter running windowed queries against one view.
#[derive(Debug)]
pub struct ViewStoreAdapter<C> {
    client: C,
    view: ViewName,
}

impl<C: ViewClient> ViewStoreAdapter<C> {
    /// Creates an adapter querying `view` through `client`.
    pub fn new(client: C, view: ViewName) -> Self {
        Self { client, view }
    }
}

impl<C: ViewClient> StoreAdapter for ViewStoreAdapter<C> {
    fn execute(&mut self, window: &QueryWindow) -> Result<RowStream<'_>, StoreError> {
        let query = ViewQuery::new(&self.view, window);
        if query.development {
            info!(view = %self.view, "start development query");
        } else {
            info!(view = %self.view, "start query");
        }

        let response = self
            .client
            .query(&query)
            .map_err(|e| e.with_remediation(missing_view_hint()))?;
        if let Some(total) = response.total_rows {
            debug!(total, rows = response.rows.len(), "view answered");
        }
        Ok(Box::new(response.rows.into_iter()))
    }
}
