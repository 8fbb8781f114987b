use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        extractors::CurrentUser,
        password::{hash_password, verify_password},
    },
    error::{ApiError, AuthError},
    state::AppState,
    store::UserStore,
};

use super::dto::ChangePasswordRequest;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_profile))
        .route("/users/password-change", put(change_password))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or(ApiError::Unauthorized(AuthError::InvalidCredentials))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if payload.new_password.len() < 6 {
        return Err(ApiError::Validation("New password too short".into()));
    }

    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or(ApiError::Unauthorized(AuthError::InvalidCredentials))?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "password change with wrong current password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let password_hash = hash_password(&payload.new_password)?;
    if !state.users.set_password_hash(user.id, &password_hash).await? {
        return Err(ApiError::Unauthorized(AuthError::InvalidCredentials));
    }

    info!(user_id = user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
