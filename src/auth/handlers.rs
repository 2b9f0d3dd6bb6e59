use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    accounts::{repo_types::Identity, services::is_valid_email},
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        jwt::{cleared_session_cookie, JwtKeys},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    let email = payload.email.trim();
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Please fill in all fields".into()));
    }

    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    state.directory.create(name, email, &payload.password).await?;
    Ok((StatusCode::CREATED, "success"))
}

fn issue_tokens(
    keys: &JwtKeys,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let access_token = keys.sign_access(&identity)?;
    let refresh_token = keys.sign_refresh(&identity)?;
    let cookie = keys.session_cookie(&access_token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            access_token,
            refresh_token,
            user: identity,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let Some(identity) = state.directory.verify_credential(email, &payload.password).await? else {
        warn!("login rejected");
        return Err(AppError::InvalidCredentials);
    };

    info!(user_id = %identity.id, role = %identity.role, status = %identity.status, "user logged in");
    issue_tokens(&JwtKeys::from_ref(&state), identity)
}

/// Re-reads the account so status changes made by an admin show up in the new tokens.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        AppError::InvalidCredentials
    })?;

    let account = state
        .directory
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    issue_tokens(&keys, Identity::from(&account))
}

#[instrument]
pub async fn logout() -> impl IntoResponse {
    info!("session cleared");
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cleared_session_cookie())],
    )
}
