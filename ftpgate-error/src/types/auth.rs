use std::{any::Any, fmt};

use crate::{ErrorExt, StatusCode, StoreError};

/// Ошибки хранилища учётных записей (Authenticator).
///
/// Первые четыре варианта являются ожидаемыми сигналами управления
/// потоком, а не сбоями.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Пользователь уже существует
    UserExists { username: String },
    /// Пользователь не найден
    UserDoesntExist { username: String },
    /// Группа уже существует
    GroupExists { group: String },
    /// Группа не найдена
    GroupDoesntExist { group: String },
    /// Ошибка хеширования пароля
    PasswordHashFailed { reason: String },
    /// Сбой хранилища или кодека, передаётся без изменений
    Store(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Команда недопустима в текущем состоянии сессии
    WrongState { required: String, actual: String },
    /// PASS без предшествующего USER
    BadSequence,
    /// Неверное имя пользователя или пароль
    NotLoggedIn,
    /// Переход между состояниями запрещён
    InvalidTransition { from: String, to: String },
    /// Ошибка хранилища при загрузке учётной записи
    Auth(AuthError),
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для AuthError, SessionError
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for AuthError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::UserExists { .. } => write!(f, "user exists"),
            Self::UserDoesntExist { .. } => write!(f, "user does not exist"),
            Self::GroupExists { .. } => write!(f, "group exists"),
            Self::GroupDoesntExist { .. } => write!(f, "group does not exist"),
            Self::PasswordHashFailed { reason } => {
                write!(f, "Password hashing failed: {reason}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::WrongState { required, actual } => {
                write!(f, "command requires state {required}, session is {actual}")
            }
            Self::BadSequence => write!(f, "bad sequence of commands"),
            Self::NotLoggedIn => write!(f, "not logged in"),
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid session transition {from} -> {to}")
            }
            Self::Auth(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<AuthError> for SessionError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl ErrorExt for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UserExists { .. } => StatusCode::UserExists,
            Self::UserDoesntExist { .. } => StatusCode::UserNotFound,
            Self::GroupExists { .. } => StatusCode::GroupExists,
            Self::GroupDoesntExist { .. } => StatusCode::GroupNotFound,
            Self::PasswordHashFailed { .. } => StatusCode::PasswordHashFailed,
            Self::Store(err) => err.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            // Имя пользователя клиенту не показываем
            Self::UserDoesntExist { .. } => "Authentication failed".to_string(),
            Self::UserExists { .. } => "User already exists".to_string(),
            Self::GroupExists { .. } => "Group already exists".to_string(),
            Self::GroupDoesntExist { .. } => "Group does not exist".to_string(),
            Self::PasswordHashFailed { .. } => "Internal server error".to_string(),
            Self::Store(err) => err.client_message(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "auth".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::UserExists { username } | Self::UserDoesntExist { username } => {
                tags.push(("username", username.clone()));
            }
            Self::GroupExists { group } | Self::GroupDoesntExist { group } => {
                tags.push(("group", group.clone()));
            }
            _ => {}
        }

        tags
    }
}

impl ErrorExt for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::WrongState { .. } | Self::BadSequence | Self::InvalidTransition { .. } => {
                StatusCode::BadSequence
            }
            Self::NotLoggedIn => StatusCode::NotLoggedIn,
            Self::Auth(err) => err.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::WrongState { .. } | Self::BadSequence | Self::InvalidTransition { .. } => {
                "Bad sequence of commands".to_string()
            }
            Self::NotLoggedIn => "Not logged in".to_string(),
            Self::Auth(err) => err.client_message(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
