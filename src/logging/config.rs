use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::LoggingError;

/// Формат строк лога.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Директива фильтра (`info`, `ftpgate=debug,warn`, ...).
    /// `RUST_LOG` имеет приоритет.
    pub level: String,
    pub format: LogFormat,
    /// ANSI-цвета в консоли.
    pub ansi: bool,
    /// Файл лога с ежедневной ротацией. Без него пишем только в консоль.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Проверяет, что у файла лога есть имя.
    pub fn validate(&self) -> Result<(), LoggingError> {
        if let Some(file) = &self.file {
            if file.file_name().is_none() {
                return Err(LoggingError::InvalidFile(file.clone()));
            }
        }
        Ok(())
    }
}
