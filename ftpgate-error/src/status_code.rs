use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки данных и разбора правил
/// - 3xxx: Аутентификация / Разрешения
/// - 5xxx: Хранилище учётных записей
/// - 6xxx: Ввод-вывод
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Ошибки данных ===
    NotFound = 2000,
    AlreadyExists = 2001,
    InvalidRule = 2010,
    InvalidScope = 2011,
    DuplicateRule = 2012,

    // === 3xxx: Авторизация/Разрешение ===
    AuthFailed = 3000,
    PermissionDenied = 3001,
    UserNotFound = 3004,
    UserExists = 3005,
    PasswordHashFailed = 3007,
    GroupNotFound = 3010,
    GroupExists = 3011,
    BadSequence = 3012,
    NotLoggedIn = 3013,

    // === 5xxx: Хранилище ===
    StorageUnavailable = 5000,
    CorruptedData = 5002,
    SerializationFailed = 5003,
    DeserializationFailed = 5004,

    // === 6xxx: Сеть/IO ===
    Io = 6000,
    Timeout = 6002,
    Cancelled = 6003,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Имеет ли смысл повторить операцию.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Cancelled | Self::StorageUnavailable)
    }

    /// Ошибка со стороны клиента: проблема в запросе, данных или правилах.
    pub fn is_client_error(&self) -> bool {
        let c = self.code();
        if (2000..=4999).contains(&c) {
            return true;
        }
        matches!(self, Self::InvalidArgs)
    }

    /// Ошибка сервера: внутренняя или инфраструктурная.
    pub fn is_server_error(&self) -> bool {
        matches!(self.code(), 1000..=1999 | 5000..=7999)
    }

    /// Требуется ли логировать как критическую ошибку.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Internal | Self::CorruptedData | Self::StorageUnavailable
        )
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::NotFound
            | Self::AlreadyExists
            | Self::UserNotFound
            | Self::UserExists
            | Self::GroupNotFound
            | Self::GroupExists => LogLevel::Debug,
            Self::InvalidArgs
            | Self::InvalidRule
            | Self::InvalidScope
            | Self::DuplicateRule
            | Self::AuthFailed
            | Self::PermissionDenied
            | Self::BadSequence
            | Self::NotLoggedIn => LogLevel::Info,
            Self::Timeout | Self::Cancelled => LogLevel::Warn,
            Self::Internal | Self::CorruptedData | Self::StorageUnavailable => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    /// Код ответа FTP (RFC 959), соответствующий коду статуса.
    pub fn ftp_reply(&self) -> u16 {
        match self {
            Self::Success => 200,
            Self::InvalidArgs => 501,
            Self::BadSequence => 503,
            Self::AuthFailed | Self::NotLoggedIn => 530,
            Self::PermissionDenied | Self::NotFound => 550,
            Self::Timeout | Self::Cancelled | Self::StorageUnavailable => 421,
            _ => 451,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
