use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, AuthError},
    state::AppState,
    store::{NewUser, UserStore},
};

use super::{
    dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(register))
        .route("/auth/login", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(ApiError::Validation("Username must not be empty".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    if state
        .users
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("Username already registered".into()));
    }
    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .insert(NewUser {
            username: payload.username,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
            role: payload.role,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Unknown username, wrong password and deactivated account all collapse to
/// the same 401 so the response never confirms that a username exists.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();

    let user = match state.users.find_by_username(username).await? {
        Some(user) if user.is_active => user,
        Some(_) | None => {
            warn!(username, "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.username, user.id, user.role)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}
