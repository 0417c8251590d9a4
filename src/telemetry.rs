//! Tracing setup.
//!
//! The TUI owns stdout, so events go to a log file in the state directory.
//! - LOG_LEVEL controls the filter (e.g. "debug" or "info,session=trace").
//! - LOG_FORMAT selects "pretty" (default) or "json".

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,session=debug,store=debug";

pub fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to `log_path`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    // An already installed subscriber is fine (tests, repeated init).
    let _ = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
    Ok(())
}
