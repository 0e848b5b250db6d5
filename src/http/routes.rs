//! Request handlers.
//!
//! Thin glue: each handler runs the guard through [`CurrentUser`] or [`AdminUser`], checks the
//! role, and calls into `points`. Bodies use closed schemas.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::session::SessionStore;
use crate::auth::user::{Role, UserDirectory, UserId, UserIdentity};
use crate::error::AccessError;
use crate::http::extract::{AdminUser, CurrentUser, ValidJson};
use crate::http::server::AppState;
use crate::points::{
    award_renewal_points, calculate_renewal_points, LedgerEntry, LedgerStore, MembershipPlan,
};

const SELLER_ROLES: &[Role] = &[Role::Seller, Role::Admin];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOverview {
    pub user_id: UserId,
    pub role: Role,
    pub balance: i64,
}

/// Manual ledger adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdjustPointsRequest {
    pub user_id: UserId,
    pub delta: i64,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalPointsResponse {
    pub points: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalResponse {
    pub user_id: UserId,
    pub points: u64,
    pub balance: i64,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserIdentity> {
    Json(user)
}

pub async fn points_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<BalanceResponse>, AccessError> {
    let balance = state.balances.balance(&user.id).await?;
    Ok(Json(BalanceResponse { user_id: user.id, balance }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AccessError> {
    if let Some(token) = state.guard.token(&headers) {
        state.sessions.delete_session_by_token(&token).await?;
    }
    tracing::info!(user_id = %user.id, "Session ended");

    let cookie_name = state.config.load().session.cookie_name.clone();
    let mut response = StatusCode::NO_CONTENT.into_response();
    let expired = format!("{cookie_name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn seller_overview(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<SellerOverview>, AccessError> {
    current.require_role(SELLER_ROLES)?;
    let user = current.0;
    let balance = state.balances.balance(&user.id).await?;
    Ok(Json(SellerOverview {
        user_id: user.id,
        role: user.role,
        balance,
    }))
}

pub async fn adjust_points(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(body): ValidJson<AdjustPointsRequest>,
) -> Result<Json<BalanceResponse>, AccessError> {
    if body.delta == 0 {
        return Err(AccessError::InvalidInput("delta must not be zero".into()));
    }
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AccessError::InvalidInput("reason must not be empty".into()));
    }
    ensure_user(&state, &body.user_id).await?;

    state
        .ledger
        .append(LedgerEntry::new(body.user_id.clone(), body.delta).with_reason(reason))
        .await?;
    tracing::info!(
        admin_id = %admin.id,
        user_id = %body.user_id,
        delta = body.delta,
        "Points adjusted"
    );

    let balance = state.balances.balance(&body.user_id).await?;
    Ok(Json(BalanceResponse {
        user_id: body.user_id,
        balance,
    }))
}

pub async fn preview_renewal_points(
    _admin: AdminUser,
    ValidJson(plan): ValidJson<MembershipPlan>,
) -> Result<Json<RenewalPointsResponse>, AccessError> {    Ok(Json(RenewalPointsResponse {
        points: calculate_renewal_points(&plan),
    }))
}

pub async fn apply_renewal(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _admin: AdminUser,
    ValidJson(plan): ValidJson<MembershipPlan>,
) -> Result<Json<RenewalResponse>, AccessError> {    let user_id = UserId::new(user_id);
    ensure_user(&state, &user_id).await?;

    let points = award_renewal_points(state.ledger.as_ref(), &user_id, &plan).await?;
    let balance = state.balances.balance(&user_id).await?;
    Ok(Json(RenewalResponse {
        user_id,
        points,
        balance,
    }))
}

pub async fn user_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    _admin: AdminUser,
) -> Result<Json<BalanceResponse>, AccessError> {    let user_id = UserId::new(user_id);
    ensure_user(&state, &user_id).await?;

    let balance = state.balances.balance(&user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

async fn ensure_user(state: &AppState, user_id: &UserId) -> Result<(), AccessError> {
    match state.users.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AccessError::NotFound(format!("user {user_id}"))),
    }
}
