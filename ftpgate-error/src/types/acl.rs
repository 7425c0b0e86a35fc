use std::{any::Any, fmt};

use crate::{ErrorExt, StatusCode};

/// Ошибки разбора ACL-выражений, правил и построения набора разрешений.
///
/// Тексты `Display` являются частью контракта: загрузчик конфигурации
/// показывает их оператору как есть.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    /// Пустая строка ACL
    EmptyInput,
    /// После префикса (`!`, `-`, `=`) ничего нет
    ExpectedAfter { prefix: char },
    /// Подстановка `*` в пользовательской форме (`-*`)
    BadUser { name: String },
    /// Подстановка `*` в групповой форме (`=*`)
    BadGroup { name: String },
    /// В строке правила меньше трёх полей
    MissingFields,
    /// Неизвестная область действия правила
    UnknownScope { scope: String },
    /// Повторное правило для одной пары (scope, path)
    DuplicatePath { path: String, scope: String },
}

impl fmt::Display for AclError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "no input string given"),
            Self::ExpectedAfter { prefix } => write!(f, "expected string after '{prefix}'"),
            Self::BadUser { name } => write!(f, "bad user '{name}'"),
            Self::BadGroup { name } => write!(f, "bad group '{name}'"),
            Self::MissingFields => write!(f, "rule requires minimum of 3 fields"),
            Self::UnknownScope { scope } => write!(f, "unknown permission scope '{scope}'"),
            Self::DuplicatePath { path, scope } => {
                write!(f, "path '{path}' for scope '{scope}' already exists")
            }
        }
    }
}

impl std::error::Error for AclError {}

impl ErrorExt for AclError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyInput
            | Self::ExpectedAfter { .. }
            | Self::BadUser { .. }
            | Self::BadGroup { .. }
            | Self::MissingFields => StatusCode::InvalidRule,
            Self::UnknownScope { .. } => StatusCode::InvalidScope,
            Self::DuplicatePath { .. } => StatusCode::DuplicateRule,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "acl".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::UnknownScope { scope } => tags.push(("scope", scope.clone())),
            Self::DuplicatePath { path, scope } => {
                tags.push(("scope", scope.clone()));
                tags.push(("path", path.clone()));
            }
            _ => {}
        }

        tags
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
