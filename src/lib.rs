/// Access control: scopes, ACL grammar, rules and path-resolved permissions.
pub mod acl;
/// Credentials: users, groups, password hashing, login sessions.
pub mod auth;
/// Settings and rules-file loading.
pub mod config;
/// Logging setup (filters, console and file sinks).
pub mod logging;
/// Transactional key-value store behind the authenticator.
pub mod store;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// ACL and permission checks.
pub use acl::{
    Acl, AclBuilder, Collection, Identity, Permissions, Rule, Scope, SharedPermissions, Subject,
};
/// Credential store and sessions.
pub use auth::{
    verify_password, Authenticator, AuthenticatorOptions, Group, HashAlgorithm, PasswordConfig,
    PasswordHasher, Session, SessionState, StoreAuthenticator, User,
};
/// Configuration.
pub use config::{load_permissions, load_rules, parse_rules, RulesError, Settings, StoreSettings};
/// Operation errors and result types.
pub use ftpgate_error::{
    AclError, AuthError, AuthResult, ErrorExt, SessionError, StatusCode, StoreError, StoreResult,
};
/// Logging.
pub use logging::{init_logging, log_error, LogFormat, LoggingConfig, LoggingError, LoggingHandle};
/// Store.
pub use store::{Backend, CommitGate, FileBackend, MemoryBackend, Store};
