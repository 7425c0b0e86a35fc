pub mod authenticator;
pub mod entry;
pub mod password;
pub mod session;

pub use authenticator::*;
pub use entry::*;
pub use password::*;
pub use session::*;
