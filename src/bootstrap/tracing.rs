//! Tracing configuration for selkit
//!
//! ## Behavior / 行为
//!
//! - `RUST_LOG` wins when set; otherwise defaults from
//!   [`build_filter_directives`]
//! - Human-readable output goes to stderr so that stdout stays free for
//!   command output
//! - With `logging.file_logging`, a second non-blocking layer writes
//!   `selkit.log` under the log directory

use std::{fs, io, path::PathBuf, sync::OnceLock};

use sel_core::config::LoggingConfig;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// ## Behavior / 行为
/// - **Development**: debug for the selection crates
/// - **Production**: info, with transfer chatter kept at info as well
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        level.to_string(),
        format!("sel_app={level}"),
        format!("sel_infra={level}"),
        "sel_core=info".to_string(),
    ]
}

/// Initialize the global tracing subscriber.
///
/// Call once, before the session is created.
///
/// ## Errors / 错误
///
/// Returns `Err` if a subscriber is already registered.
pub fn init_tracing_subscriber(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_directives.join(",")));

    let stderr_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
        .with_level(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stderr));

    let file_writer = if logging.file_logging {
        match build_file_writer(logging) {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, continuing without it: {err}");
                None
            }
        }
    } else {
        None
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

fn log_dir(logging: &LoggingConfig) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &logging.log_dir {
        return Ok(dir.clone());
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("selkit").join("logs"))
        .ok_or_else(|| anyhow::anyhow!("No local data directory on this platform"))
}

fn build_file_writer(logging: &LoggingConfig) -> anyhow::Result<NonBlocking> {
    let dir = log_dir(logging)?;
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::never(&dir, "selkit.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
