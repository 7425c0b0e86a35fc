use std::fmt;

use ftpgate_error::{AuthError, SessionError};
use tracing::{debug, info};

use super::{authenticator::Authenticator, entry::User};
use crate::acl::{Identity, Permissions, Scope};

/// Состояние управляющего соединения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Ожидает USER/PASS.
    Auth,
    /// Пользователь вошёл.
    LoggedIn,
    /// Соединение закрыто, дальнейшие команды отвергаются.
    Closed,
}

/// Сессия одного клиента: состояние, введённое имя и вошедший пользователь.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    login: Option<String>,
    user: Option<User>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SessionState {
    /// Таблица переходов.
    pub fn can_transition(
        self,
        to: SessionState,
    ) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Auth, LoggedIn) | (LoggedIn, Auth) | (Auth, Closed) | (LoggedIn, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Auth => "auth",
            SessionState::LoggedIn => "logged-in",
            SessionState::Closed => "closed",
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Auth,
            login: None,
            user: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Имя из последней команды USER, ещё не подтверждённое паролем.
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    /// Вошедший пользователь.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Проверка предусловия команды.
    pub fn require(
        &self,
        required: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == required {
            return Ok(());
        }
        Err(SessionError::WrongState {
            required: required.to_string(),
            actual: self.state.to_string(),
        })
    }

    /// USER: запоминает имя для следующего PASS.
    pub fn user_command(
        &mut self,
        name: &str,
    ) -> Result<(), SessionError> {
        self.require(SessionState::Auth)?;
        self.login = (!name.is_empty()).then(|| name.to_string());
        Ok(())
    }

    /// PASS: проверяет пароль для имени из USER.
    ///
    /// Без предшествующего USER возвращает `BadSequence`. При неверном
    /// пароле введённое имя сбрасывается и возвращается `NotLoggedIn`,
    /// независимо от того, существует ли пользователь.
    pub async fn pass_command(
        &mut self,
        auth: &dyn Authenticator,
        password: &str,
    ) -> Result<&User, SessionError> {
        self.require(SessionState::Auth)?;
        let login = self.login.take().ok_or(SessionError::BadSequence)?;

        if !auth.check_password(&login, password).await {
            info!(user = %login, "Login failed");
            return Err(SessionError::NotLoggedIn);
        }

        let user = match auth.get_user(&login).await {
            Ok(user) => user,
            // удалён между проверкой пароля и загрузкой
            Err(AuthError::UserDoesntExist { .. }) => return Err(SessionError::NotLoggedIn),
            Err(err) => return Err(err.into()),
        };

        self.transition(SessionState::LoggedIn)?;
        info!(user = %login, "Login succeeded");
        Ok(self.user.insert(user))
    }

    /// REIN: возвращает сессию к ожиданию входа.
    pub fn reinitialize(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Auth => {
                self.login = None;
                Ok(())
            }
            _ => {
                self.transition(SessionState::Auth)?;
                self.login = None;
                self.user = None;
                Ok(())
            }
        }
    }

    /// QUIT.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            debug!(from = %self.state, "Session closed");
        }
        self.state = SessionState::Closed;
        self.login = None;
        self.user = None;
    }

    /// Проверяет право вошедшего пользователя на действие с путём.
    /// До входа всегда `false`.
    pub fn allowed(
        &self,
        permissions: &Permissions,
        scope: Scope,
        path: &str,
    ) -> bool {
        match (&self.state, &self.user) {
            (SessionState::LoggedIn, Some(user)) => permissions.allowed(scope, path, user),
            _ => false,
        }
    }

    fn transition(
        &mut self,
        to: SessionState,
    ) -> Result<(), SessionError> {
        if !self.state.can_transition(to) {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        debug!(from = %self.state, to = %to, "Session transition");
        self.state = to;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for SessionState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Identity for Session {
    fn name(&self) -> &str {
        self.user.as_ref().map(User::name).unwrap_or("")
    }

    fn groups(&self) -> &[String] {
        self.user.as_ref().map(User::groups).unwrap_or(&[])
    }

    fn flags(&self) -> &[String] {
        self.user.as_ref().map(User::flags).unwrap_or(&[])
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
