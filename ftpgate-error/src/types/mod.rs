pub mod acl;
pub mod auth;
pub mod store;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use acl::*;
pub use auth::*;
pub use store::*;

/// Результат операций хранилища.
pub type StoreResult<T> = Result<T, StoreError>;

/// Результат операций Authenticator.
pub type AuthResult<T> = Result<T, AuthError>;
