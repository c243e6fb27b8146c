//! Structured logging setup shared by the server and the CLI.

use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Initialize tracing to stdout and to a log file under `config.dir`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process. When the directory cannot be created, logging
/// continues on stdout only.
pub fn init_tracing(config: &LoggingConfig, default_filter: &str) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_writer, guard) = match std::fs::create_dir_all(&config.dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(&config.dir, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Err(err) => {
            eprintln!(
                "Cannot create log directory {}: {}; logging to stdout only",
                config.dir.display(),
                err
            );
            (None, None)
        }
    };

    let stdout_layer = if config.json {
        fmt::layer().json().with_writer(io::stdout).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(std::env::var("NO_COLOR").is_err())
            .boxed()
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
