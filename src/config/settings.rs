use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{auth::PasswordConfig, logging::LoggingConfig};

/// Префикс переменных окружения: `FTPGATE_STORE__PATH` -> `store.path`.
pub const ENV_PREFIX: &str = "FTPGATE";

/// Настройки хранилища учётных данных.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Файл store. Без него данные живут только в памяти.
    pub path: Option<PathBuf>,
    /// Таймаут одной операции со store в миллисекундах.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Файл правил доступа.
    pub rules_path: Option<PathBuf>,
    pub store: StoreSettings,
    pub password: PasswordConfig,
    pub logging: LoggingConfig,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_ms: 5_000,
        }
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Собирает настройки: значения по умолчанию, затем файл (если указан),
    /// затем переменные окружения `FTPGATE_*`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("store.timeout_ms", 5_000)?
            .set_default("logging.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let cfg = builder
            // Добавляем переменные окружения с префиксом FTPGATE_
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        cfg.try_deserialize()
    }
}
