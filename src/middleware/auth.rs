use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{error::AppError, models::PublicUser, routes::AppState};

const NOT_AUTHENTICATED: &str = "Not authenticated.";

/// The signed-in user, taken from a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser(pub PublicUser);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

/// Like [`AuthUser`], but a request without an `Authorization` header passes
/// through anonymously. A header carrying a bad token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(AuthUser::user_id)
    }
}

fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))?;

    let claims = state.auth.tokens().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser(claims.user))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Self(None));
        }
        authenticate(&parts.headers, state).map(|user| Self(Some(user)))
    }
}
