use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::AuthUser,
    routes::AppState,
    services::auth::{
        ChangePasswordRequest, ForgotPasswordOutcome, ForgotPasswordRequest, LoginRequest,
        SignupRequest,
    },
};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> AppResult<Json<Value>> {
    state.auth.signup(request).await?;
    Ok(Json(json!({ "message": "User created" })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let result = state.auth.login(request).await?;
    Ok(Json(json!({
        "message": "Login successfull",
        "token": result.token,
        "user": result.user,
    })))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    let profile = state.auth.profile(user.user_id()).await?;
    Ok(Json(json!({
        "message": "User details fetched",
        "user": profile.user,
        "history": profile.history,
    })))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    state.auth.change_password(user.user_id(), request).await?;
    Ok(Json(json!({ "message": "Password updated successfully!" })))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<Json<Value>> {
    let message = match state.auth.forgot_password(request).await? {
        ForgotPasswordOutcome::CodeSent => "Please check email for verification code",
        ForgotPasswordOutcome::PasswordReset => "Successfully reset password",
    };
    Ok(Json(json!({ "message": message })))
}
