//! Reindexer CLI - dumps document identifiers for the reindexing pipeline.
//!
//! Identifiers go to stdout, one per line. Progress and errors go to stderr
//! through `tracing`; the per-target summary with resume guidance is always
//! printed to stderr, whatever the log filter.

use clap::Parser;
use reindexer_core::Orchestrator;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod output;

use config::{Args, RunConfig};

const DEFAULT_LOG_FILTER: &str = "reindexer=info,reindexer_core=info,reindexer_store=info";

fn main() {
    init_tracing();
    let args = Args::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "reindexer starting");

    let config = match RunConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            output::print_usage(&e);
            std::process::exit(1);
        }
    };

    let mut orchestrator = Orchestrator::new(&config.window);
    for target in config.targets() {
        orchestrator = orchestrator.with_target(target);
    }

    let mut out = output::identifier_sink();
    let result = orchestrator.run(&mut out, &mut |_: &str| true);
    drop(out);

    match result {
        Ok(report) => {
            for line in output::format_summary(&report) {
                eprintln!("{}", line);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
