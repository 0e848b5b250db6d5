//! Axum extractors bridging requests to the core.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::auth::guard::require_role;
use crate::auth::user::{Role, UserIdentity};
use crate::error::AccessError;
use crate::http::server::AppState;

/// The authenticated caller. Extraction runs the session guard.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

impl CurrentUser {
    /// Fails with `FORBIDDEN` unless the caller's role is in `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AccessError> {
        require_role(self.0.role, allowed)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.guard.require_session(&parts.headers).await.map(CurrentUser)
    }
}

/// An authenticated ADMIN caller.
///
/// Runs from request parts, so the role is settled before any body is read
/// and a non-admin never sees body validation errors.
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserIdentity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AccessError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(user.role, &[Role::Admin])?;
        Ok(AdminUser(user))
    }
}

/// JSON body whose schema violations surface as `INVALID_INPUT`.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AccessError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(AccessError::InvalidInput(rejection.body_text())),
        }
    }
}
