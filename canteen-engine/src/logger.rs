//! Logging setup
//!
//! Console layer always; a daily-rotating file layer when a log
//! directory is given. Production uses JSON lines, development a
//! human-readable format. `RUST_LOG` overrides the configured level.

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, EnvFilter};

/// Initialize tracing with console output and an optional log file
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json_format {
        // Level filtering lives on the registry's EnvFilter, so a more
        // verbose RUST_LOG can raise console verbosity
        let console_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);

        if let Some(dir) = log_dir {
            let log_dir = Path::new(dir);
            fs::create_dir_all(log_dir)?;
            let file = RollingFileAppender::new(Rotation::DAILY, log_dir, "canteen");
            let file_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_writer(std::sync::Mutex::new(file));
            subscriber.with(console_layer).with(file_layer).init();
        } else {
            subscriber.with(console_layer).init();
        }
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        if let Some(dir) = log_dir {
            let log_dir = Path::new(dir);
            fs::create_dir_all(log_dir)?;
            let file = RollingFileAppender::new(Rotation::DAILY, log_dir, "canteen");
            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            subscriber.with(console_layer).with(file_layer).init();
        } else {
            subscriber.with(console_layer).init();
        }
    }

    Ok(())
}

/// Console-only convenience setup
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}
