use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::user::{UserDirectory, UserId};
use crate::error::AccessError;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub uptime_secs: u64,
    pub base_origin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub enabled: bool,
    pub tracked_keys: usize,
    pub auth_limit: u32,
    pub auth_window_ms: u64,
    pub mutation_limit: u32,
    pub mutation_window_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsStatus {
    pub user_id: UserId,
    pub balance: i64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        base_origin: state.origin.base_origin().to_string(),
    })
}

pub async fn get_rate_limits(State(state): State<AppState>) -> Json<RateLimitStatus> {
    let config = state.config.load();
    let limits = &config.rate_limit;
    Json(RateLimitStatus {
        enabled: limits.enabled,
        tracked_keys: state.rate_limiter.tracked_keys(),
        auth_limit: limits.auth.limit,
        auth_window_ms: limits.auth.window_ms,
        mutation_limit: limits.mutation.limit,
        mutation_window_ms: limits.mutation.window_ms,
    })
}

pub async fn get_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PointsStatus>, AccessError> {
    let user_id = UserId::new(user_id);
    if state.users.find_user(&user_id).await?.is_none() {
        return Err(AccessError::NotFound(format!("user {user_id}")));
    }
    let balance = state.balances.balance(&user_id).await?;
    Ok(Json(PointsStatus { user_id, balance }))
}
