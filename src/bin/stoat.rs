// src/bin/stoat.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

use stoat::cli::{Cli, Commands};
use stoat::commands::inspect::inspect_input;
use stoat::commands::translate::translate_input;

/// A timer that outputs nothing but still enables span timing calculation
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(
        &self,
        _w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::fmt::Result {
        Ok(())
    }
}

fn main() -> ExitCode {
    // Initialize tracing if STOAT_LOG is set
    // STOAT_LOG_STYLE: "compact" (default) or "full" (verbose with timestamps)
    if let Ok(filter) = EnvFilter::try_from_env("STOAT_LOG") {
        let style = std::env::var("STOAT_LOG_STYLE").unwrap_or_default();
        if style == "full" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_level(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_writer(std::io::stderr)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_level(true)
                .with_timer(NoTimestamp)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_writer(std::io::stderr)
                .init();
        }
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            input,
            out,
            references,
        } => translate_input(&input, &references, &out),
        Commands::Inspect { input } => inspect_input(&input),
    }
}
