use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки транзакционного хранилища учётных записей.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Ключ не найден
    KeyNotFound { key: String },
    /// Ошибка сериализации записи
    SerializationFailed { type_name: String, reason: String },
    /// Ошибка десериализации записи
    DeserializationFailed { type_name: String, reason: String },
    /// Повреждённые данные на диске
    CorruptedData { location: String, reason: String },
    /// Ошибка ввода-вывода
    Io { reason: String },
    /// Операция не уложилась в отведённое время
    Timeout { operation: String },
    /// Транзакция отменена до начала: вызывающий перестал её ждать
    Cancelled { operation: String },
    /// Фоновая задача завершилась аварийно
    TaskFailed { reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::KeyNotFound { key } => write!(f, "Key not found: {key}"),
            Self::SerializationFailed { type_name, reason } => {
                write!(f, "Serialization failed for {type_name}: {reason}")
            }
            Self::DeserializationFailed { type_name, reason } => {
                write!(f, "Deserialization failed for {type_name}: {reason}")
            }
            Self::CorruptedData { location, reason } => {
                write!(f, "Corrupted data at {location}: {reason}")
            }
            Self::Io { reason } => write!(f, "I/O error: {reason}"),
            Self::Timeout { operation } => write!(f, "Store operation timed out: {operation}"),
            Self::Cancelled { operation } => {
                write!(f, "Store transaction cancelled before start: {operation}")
            }
            Self::TaskFailed { reason } => write!(f, "Store task failed: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl ErrorExt for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::KeyNotFound { .. } => StatusCode::NotFound,
            Self::SerializationFailed { .. } => StatusCode::SerializationFailed,
            Self::DeserializationFailed { .. } => StatusCode::DeserializationFailed,
            Self::CorruptedData { .. } => StatusCode::CorruptedData,
            Self::Io { .. } => StatusCode::Io,
            Self::Timeout { .. } => StatusCode::Timeout,
            Self::Cancelled { .. } => StatusCode::Cancelled,
            Self::TaskFailed { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Timeout { .. } | Self::Cancelled { .. } => {
                "Service temporarily unavailable".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что клиент никогда не видит деталей хранилища.
    #[test]
    fn test_client_message_hides_details() {
        let err = StoreError::CorruptedData {
            location: "/var/lib/ftpgate/auth.db".into(),
            reason: "checksum mismatch".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CorruptedData);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io { ref reason } if reason.contains("disk on fire")));
        assert_eq!(err.status_code(), StatusCode::Io);
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = StoreError::Timeout {
            operation: "get_user".into(),
        };
        assert!(err.status_code().is_retryable());
        assert_eq!(err.client_message(), "Service temporarily unavailable");
    }

    #[test]
    fn test_cancelled_is_retryable() {
        let err = StoreError::Cancelled {
            operation: "add_group".into(),
        };
        assert_eq!(err.status_code(), StatusCode::Cancelled);
        assert!(err.status_code().is_retryable());
        assert_eq!(err.to_string(), "Store transaction cancelled before start: add_group");
    }
}
