use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    accounts::{
        dto::{DashboardView, SetStatusRequest},
        repo_types::{Account, Status},
    },
    auth::jwt::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/users", get(list_users))
        .route("/dashboard/users/:id/approve", post(approve_user))
        .route("/dashboard/users/:id/reject", post(reject_user))
        .route("/dashboard/users/:id/status", put(set_user_status))
}

#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let account = state
        .directory
        .find_by_id(identity.id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let users = if identity.is_admin() {
        Some(state.directory.list().await?)
    } else {
        None
    };
    Ok(Json(DashboardView::for_account(&account, users)))
}

#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Account>>, AppError> {
    if !identity.is_admin() {
        warn!("user list refused for non-admin");
        return Err(AppError::Unauthorized);
    }
    Ok(Json(state.directory.list().await?))
}

async fn transition(
    state: &AppState,
    AuthUser(identity): AuthUser,
    target: Uuid,
    status: Status,
) -> Result<Json<Account>, AppError> {
    let account = state.directory.set_status(identity.role, target, status).await?;
    Ok(Json(account))
}

#[instrument(skip(state, user))]
pub async fn approve_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, AppError> {
    transition(&state, user, id, Status::Approved).await
}

#[instrument(skip(state, user))]
pub async fn reject_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>, AppError> {
    transition(&state, user, id, Status::Rejected).await
}

#[instrument(skip(state, user, payload))]
pub async fn set_user_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Account>, AppError> {
    transition(&state, user, id, payload.status).await
}
