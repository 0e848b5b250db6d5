//! Marketplace access gate library.
//!
//! Session/role guard, fixed-window rate limiting, same-origin enforcement and
//! membership points accounting behind an Axum API.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod points;
pub mod security;
pub mod store;

pub use config::schema::GateConfig;
pub use error::AccessError;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use store::MemoryStore;
