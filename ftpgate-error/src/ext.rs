use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок подсистемы авторизации (object-safe).
///
/// Предоставляет вспомогательные методы для работы с ошибками:
/// - извлечение статус-кода,
/// - безопасное сообщение для FTP-клиента,
/// - детализированное сообщение для логов,
/// - теги для систем наблюдаемости.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки (для ответа клиенту или для логов).
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any),
    /// чтобы можно было выполнить downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;

    /// Безопасное сообщение для клиента.
    ///
    /// Не раскрывает внутренних деталей. Для внутренних ошибок возвращает
    /// строку `"Internal server error"`.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal | StatusCode::Unexpected => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов для метрик и структурированных логов.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Короткое имя типа ошибки (без пути модуля).
    fn type_name(&self) -> String {
        short_type_name::<Self>()
    }
}

/// Имя типа без пути модуля: `ftpgate::auth::entry::User` -> `User`.
pub fn short_type_name<T: ?Sized>() -> String {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    #[derive(Debug)]
    struct DefaultError(pub &'static str);

    impl fmt::Display for DefaultError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "DefaultError: {}", self.0)
        }
    }

    impl Error for DefaultError {}

    impl ErrorExt for DefaultError {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct DeniedError(pub &'static str);

    impl fmt::Display for DeniedError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "Denied: {}", self.0)
        }
    }

    impl Error for DeniedError {}

    impl ErrorExt for DeniedError {
        fn status_code(&self) -> StatusCode {
            StatusCode::PermissionDenied
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что внутренние ошибки не раскрываются клиенту.
    #[test]
    fn test_client_message_internal() {
        let e = DefaultError("sensitive");
        assert_eq!(e.status_code(), StatusCode::Internal);
        assert_eq!(e.client_message(), "Internal server error");
    }

    /// Тест проверяет, что для клиентских кодов используется `Display`.
    #[test]
    fn test_client_message_non_internal() {
        let e = DeniedError("/pub");
        assert_eq!(e.client_message(), e.to_string());
    }

    /// Тест проверяет downcast через `as_any`.
    #[test]
    fn test_as_any_downcast() {
        let e = DeniedError("x");
        let down = e.as_any().downcast_ref::<DeniedError>();
        assert_eq!(down.map(|d| d.0), Some("x"));
    }

    /// Тест проверяет состав тегов по умолчанию.
    #[test]
    fn test_metrics_tags_and_type_name() {
        let e = DeniedError("t");
        let tags = e.metrics_tags();
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "error_type" && v.ends_with("DeniedError")));
        assert!(tags
            .iter()
            .any(|(k, v)| *k == "status_code" && v == &StatusCode::PermissionDenied.to_string()));
        assert_eq!(e.log_message(), format!("{e:?}"));
        assert_eq!(e.type_name(), "DeniedError");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<DefaultError>(), "DefaultError");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
