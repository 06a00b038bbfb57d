//! Output streams: identifiers on stdout, everything else on stderr.

use crate::config::Args;
use clap::CommandFactory;
use reindexer_core::{RunReport, TargetOutcome};
use std::fmt::Display;
use std::io::{self, BufWriter, StdoutLock};

/// Buffered sink for identifier lines.
pub fn identifier_sink() -> BufWriter<StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

/// Prints `error` followed by the usage text.
pub fn print_usage(error: &dyn Display) {
    eprintln!("{}\n", error);
    eprintln!("{}", Args::command().render_help());
}

/// One line per target, for the end of the run. Limited batches carry
/// their resume cursor.
pub fn format_summary(report: &RunReport) -> Vec<String> {
    report
        .targets
        .iter()
        .map(|target| match &target.outcome {
            TargetOutcome::Completed {
                rows_consumed,
                halted,
                resume,
            } => {
                let mut line = format!(
                    "{} {}: {} ids",
                    target.kind, target.endpoint, rows_consumed
                );
                if *halted {
                    line.push_str(" (stopped early)");
                }
                if let Some(cursor) = resume {
                    line.push_str(&format!(". {}", cursor));
                }
                line
            }
            TargetOutcome::Failed { stage, error } => {
                format!("{} {} ({}): {}", target.kind, target.endpoint, stage, error)
            }
        })
        .collect()
}
