//! Logging setup for the CLI
//!
//! - Human-readable console output on stderr
//! - Optional JSON log files with size-based and daily rotation (10MB per file)

use anyhow::Result;
use rolling_file::{RollingConditionBasic, RollingFileAppender};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Returns a guard that must be kept alive to flush file logs; `None` when no
/// log directory was given.
pub fn init_telemetry(log_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // stdout carries command output
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            // dataintel.log, rotated daily or at 10 MB, keeping up to 10 files
            let file_appender = RollingFileAppender::new(
                dir.join("dataintel.log"),
                RollingConditionBasic::new()
                    .daily()
                    .max_size(10 * 1024 * 1024),
                9,
            )?;
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(dir) = log_dir {
        tracing::debug!("file logging to {:?}", dir);
    }

    Ok(guard)
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "dataintel=debug,dataintel_core=debug,dataintel_rs=debug"
    } else {
        "dataintel=info,dataintel_core=warn,dataintel_rs=info"
    }
}
