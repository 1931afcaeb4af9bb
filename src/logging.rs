//! File logging for the terminal host. Stdout belongs to the UI, so events
//! only ever go to a file.
//!
//! Filter priority: `VERSO_LOG` > `RUST_LOG` > `warn,verso=info`.
//! `VERSO_LOG=debug` is shorthand for `warn,verso=debug`.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "warn,verso=info";

/// Keeps the background writer alive; dropping it flushes the file.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

pub fn init(log_file: Option<PathBuf>) -> Result<LogGuard> {
    let log_file = log_file.unwrap_or_else(|| env::temp_dir().join("verso.log"));
    let dir = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .with_context(|| format!("log file {} has no file name", log_file.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(create_filter());

    Registry::default()
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file,
    })
}

fn create_filter() -> EnvFilter {
    if let Ok(verso_log) = env::var("VERSO_LOG") {
        return expand_verso_log(&verso_log);
    }
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(DEFAULT_FILTER)
}

/// A bare level applies to this crate only; directives are used as-is.
fn expand_verso_log(verso_log: &str) -> EnvFilter {
    if verso_log.contains(|ch| matches!(ch, '=' | ',' | ':')) {
        return EnvFilter::new(verso_log);
    }
    EnvFilter::new(format!("warn,verso={verso_log}"))
}
