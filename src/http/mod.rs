//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, root span)
//!     → security (origin, rate limit) on /api routes
//!     → extract.rs (session guard, validated JSON)
//!     → routes.rs (handlers)
//!     → AccessError rendered as JSON on rejection
//! ```

pub mod extract;
pub mod request;
pub mod routes;
pub mod server;

pub use extract::{AdminUser, CurrentUser, ValidJson};
pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
