use tracing_subscriber::EnvFilter;

use super::{config::LoggingConfig, LoggingError};

/// Фильтр уровней: `RUST_LOG`, если задан, иначе `level` из конфигурации.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level).map_err(|source| LoggingError::InvalidFilter {
        directive: config.level.clone(),
        source,
    })
}
