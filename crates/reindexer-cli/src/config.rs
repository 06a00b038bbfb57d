//! Command-line arguments and the validated run configuration.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Parser;
use reindexer_core::{QueryWindow, StoreTarget};
use reindexer_store::{
    view_endpoint, EndpointError, SearchIndexParams, ViewName, ViewNameError, ViewStoreParams,
};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Date layout of `--start` and `--end`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Dump document identifiers from a view store and/or a search index.
#[derive(Parser, Debug)]
#[command(name = "reindexer", version, about, long_about = None)]
pub struct Args {
    /// View store connection URI (couchbase://host or http://host:8092)
    #[arg(long)]
    pub couchbase_uri: Option<String>,

    /// View store bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// View store bucket password
    #[arg(long)]
    pub bucket_password: Option<String>,

    /// Reindexer view, as designdocname:viewname
    #[arg(long)]
    pub view: Option<String>,

    /// Use the development view
    #[arg(long)]
    pub dev: bool,

    /// Search index host name or http(s)://host URL, without a port (see --solr-port)
    #[arg(long)]
    pub solr_host: Option<String>,

    /// Search index port
    #[arg(long, default_value_t = 8983)]
    pub solr_port: u16,

    /// Search index name
    #[arg(long, default_value = "onecms")]
    pub solr_index: String,

    /// Limit the number of results (0 for no limit)
    #[arg(long, default_value_t = 1000)]
    pub limit: u64,

    /// Start from this row
    #[arg(long, default_value_t = 0)]
    pub skip: u64,

    /// Starting date in the format YYYYMMDD
    #[arg(long)]
    pub start: Option<String>,

    /// Ending date in the format YYYYMMDD
    #[arg(long)]
    pub end: Option<String>,

    /// Prefix written in front of each id (empty for none)
    #[arg(long, default_value = "mutation")]
    pub prefix: String,

    /// Output unversioned ids
    #[arg(long)]
    pub unversioned: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

/// Invalid or missing command-line input. Always reported before any
/// store is contacted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither store was configured.
    #[error("missing --couchbase-uri or --solr-host parameter")]
    MissingTarget,
    /// A parameter required by the selected store is absent.
    #[error("missing --{0} parameter")]
    MissingParameter(&'static str),
    /// `--view` is not `design:view`.
    #[error("invalid --view parameter: {0}")]
    InvalidView(#[from] ViewNameError),
    /// A date flag could not be parsed.
    #[error("cannot parse --{flag} parameter '{value}': {reason}")]
    InvalidDate {
        /// Flag name.
        flag: &'static str,
        /// Offending value.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// A store endpoint is malformed.
    #[error("invalid --{flag} parameter: {source}")]
    InvalidEndpoint {
        /// Flag name.
        flag: &'static str,
        /// Endpoint error.
        #[source]
        source: EndpointError,
    },
}

/// Everything one run needs, built once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Query window shared by all targets.
    pub window: QueryWindow,
    /// View store target, if configured.
    pub view_store: Option<ViewStoreParams>,
    /// Search index target, if configured.
    pub search_index: Option<SearchIndexParams>,
}

impl RunConfig {
    /// Validates `args`.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let uri = non_empty(&args.couchbase_uri);
        let solr_host = non_empty(&args.solr_host);
        if uri.is_none() && solr_host.is_none() {
            return Err(ConfigError::MissingTarget);
        }

        let timeout = Duration::from_secs(args.timeout_secs);
        let view_store = match uri {
            Some(uri) => Some(view_store_params(args, uri, timeout)?),
            None => None,
        };

        let window = QueryWindow {
            development_mode: args.dev,
            limit: Some(args.limit),
            skip: args.skip,
            start_time: parse_date("start", non_empty(&args.start))?,
            end_time: parse_date("end", non_empty(&args.end))?,
            id_prefix: args.prefix.clone(),
            unversioned: args.unversioned,
        };

        let search_index = match solr_host {
            Some(host) => Some(
                SearchIndexParams::new(host, args.solr_port, &args.solr_index, timeout).map_err(
                    |source| ConfigError::InvalidEndpoint {
                        flag: "solr-host",
                        source,
                    },
                )?,
            ),
            None => None,
        };

        if window.id_prefix == "deletion" && !window.unversioned {
            warn!("deletion mutations expect unversioned ids, use --unversioned");
        }
        if window.development_mode && view_store.is_none() {
            warn!("--dev only applies to the view store");
        }

        Ok(Self {
            window,
            view_store,
            search_index,
        })
    }

    /// Configured targets.
    pub fn targets(&self) -> Vec<&dyn StoreTarget> {
        let mut targets: Vec<&dyn StoreTarget> = Vec::new();
        if let Some(view_store) = &self.view_store {
            targets.push(view_store);
        }
        if let Some(search_index) = &self.search_index {
            targets.push(search_index);
        }
        targets
    }
}

fn view_store_params(
    args: &Args,
    uri: &str,
    timeout: Duration,
) -> Result<ViewStoreParams, ConfigError> {
    let bucket = non_empty(&args.bucket).ok_or(ConfigError::MissingParameter("bucket"))?;
    let view = non_empty(&args.view).ok_or(ConfigError::MissingParameter("view"))?;
    let view = ViewName::parse(view)?;
    let endpoint = view_endpoint(uri).map_err(|source| ConfigError::InvalidEndpoint {
        flag: "couchbase-uri",
        source,
    })?;
    Ok(ViewStoreParams {
        endpoint,
        bucket: bucket.to_string(),
        password: non_empty(&args.bucket_password).map(str::to_string),
        view,
        timeout,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parses a `YYYYMMDD` date flag into midnight UTC.
pub fn parse_date(
    flag: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let invalid = |reason: String| ConfigError::InvalidDate {
        flag,
        value: value.to_string(),
        reason,
    };
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| invalid(e.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| invalid("no midnight on this date".to_string()))?;
    Ok(Some(Utc.from_utc_datetime(&midnight)))
}
