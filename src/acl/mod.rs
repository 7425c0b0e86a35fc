//! Access control for filesystem actions.
//!
//! - `scope`: closed set of action kinds (download, upload, ...).
//! - `collection`: one side (allow or block) of an ACL.
//! - `acl`: ACL text grammar and the precedence-ordered decision.
//! - `identity`: the subject presented to a check.
//! - `rule`: one `<scope> <path> <acl>` line.
//! - `permissions`: all rules, resolved by most specific path.

#[allow(clippy::module_inception)]
pub mod acl;
pub mod collection;
pub mod identity;
pub mod permissions;
pub mod rule;
pub mod scope;

pub use acl::*;
pub use collection::*;
pub use identity::*;
pub use permissions::*;
pub use rule::*;
pub use scope::*;
