//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request headers
//!     → token.rs (session cookie, else Bearer header)
//!     → guard.rs (store lookup, expiry + disabled checks)
//!     → UserIdentity handed to the handler
//!     → guard::require_role (exact role membership)
//! ```
//!
//! # Design Decisions
//! - The guard only reads; sessions are created and destroyed elsewhere
//! - Expired and disabled sessions are indistinguishable to the caller (401)
//! - Roles are a closed enum, never a hierarchy

pub mod guard;
pub mod session;
pub mod token;
pub mod user;

pub use guard::{require_role, SessionGuard};
pub use session::{SessionRecord, SessionStore};
pub use token::{HeaderTokenSource, TokenSource};
pub use user::{Role, UserDirectory, UserId, UserIdentity};
