#[cfg(test)]
mod capture;
pub mod config;
mod filters;
pub mod handle;
mod report;
pub mod sinks;

use std::{io, path::PathBuf};

pub use config::{LogFormat, LoggingConfig};
pub use handle::LoggingHandle;
pub use report::log_error;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("log file path '{}' has no file name", .0.display())]
    InvalidFile(PathBuf),
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("failed to install global subscriber: {0}")]
    Init(String),
}

/// Устанавливает глобальный subscriber: фильтр, консоль и, если задан,
/// файл с ежедневной ротацией.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingHandle, LoggingError> {
    config.validate()?;

    let env_filter = filters::build_filter(config)?;
    let mut layers = Vec::new();

    layers.push(sinks::console::layer(config));

    let file_guard = match &config.file {
        Some(path) => {
            let (file_layer, guard) = sinks::file::layer(path, config.format)?;
            layers.push(file_layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = ?config.format,
        file = ?config.file,
        "Logging initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
