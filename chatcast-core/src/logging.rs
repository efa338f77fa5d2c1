//! Tracing setup for the chatcast binary.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! level. Output goes to stderr or an append-only log file, as human-readable
//! lines or JSON.

use std::fs::File;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = env_filter(&config.level)?;
    let json = json_format(&config.format)?;
    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            File::options().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match (json, file) {
        (true, Some(file)) => registry
            .with(fmt::layer().json().with_writer(file))
            .init(),
        (true, None) => registry.with(fmt::layer().json()).init(),
        (false, Some(file)) => registry
            .with(fmt::layer().with_ansi(false).with_writer(file))
            .init(),
        (false, None) => registry.with(fmt::layer()).init(),
    }
    Ok(())
}

fn env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let level = parse_level(level)?;
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(EnvFilter::new(level.to_string()))
}

fn parse_level(level: &str) -> anyhow::Result<Level> {
    level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level: {level}"))
}

fn json_format(format: &str) -> anyhow::Result<bool> {
    match format {
        "json" => Ok(true),
        "pretty" | "text" => Ok(false),
        other => Err(anyhow::anyhow!("unknown log format: {other}")),
    }
}
