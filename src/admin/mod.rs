//! Ops API: status and inspection endpoints on a separate listener.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::ops_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_ops_router(state: AppState) -> Router {
    Router::new()
        .route("/ops/status", get(get_status))
        .route("/ops/rate-limits", get(get_rate_limits))
        .route("/ops/points/{user_id}", get(get_points))
        .layer(middleware::from_fn_with_state(state.clone(), ops_auth_middleware))
        .with_state(state)
}
