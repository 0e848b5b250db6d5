//! Request security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (mutating requests: Origin/Referer must match base origin)
//!     → rate_limit.rs (fixed window per rule + client IP)
//!     → auth::guard (session and role)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Every rejection is an `AccessError` rendered at the boundary
//! - Components are built once at startup and shared through `AppState`
//! - No trust in client input

pub mod origin;
pub mod rate_limit;

pub use origin::{same_origin_middleware, SameOriginEnforcer};
pub use rate_limit::{rate_limit_middleware, RateLimitDecision, RateLimitRequest, RateLimiter};
