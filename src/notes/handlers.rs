use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    accounts::repo_types::{Identity, Status},
    auth::jwt::AuthUser,
    error::AppError,
    notes::{
        dto::{GenerateRequest, GenerateResponse},
        repo_types::Note,
    },
    state::AppState,
};

pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/study-notes", get(list_notes).post(generate_notes))
        .route("/dashboard/study-notes/:id", delete(delete_note))
}

pub fn preview_routes() -> Router<AppState> {
    Router::new().route("/preview", post(preview_notes))
}

/// Generation is for approved accounts; the token's status may be stale, so re-read it.
async fn require_approved(state: &AppState, identity: &Identity) -> Result<(), AppError> {
    let account = state
        .directory
        .find_by_id(identity.id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    match account.status {
        Status::Approved => Ok(()),
        Status::Pending => Err(AppError::NotApproved("Your account is pending approval.")),
        Status::Rejected => Err(AppError::NotApproved(
            "Your account has been rejected. Please contact support.",
        )),
    }
}

#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn list_notes(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.notes.list_for_owner(identity.id).await?))
}

#[instrument(skip(state, identity, payload), fields(user_id = %identity.id))]
pub async fn generate_notes(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    require_approved(&state, &identity).await?;
    let generated = state.notes.generate(&payload.url, Some(identity.id)).await?;
    Ok((StatusCode::CREATED, Json(generated.into())))
}

/// Always 204: deleting someone else's note or a missing one changes nothing.
#[instrument(skip(state, identity), fields(user_id = %identity.id))]
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.notes.delete_for_owner(id, identity.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn preview_notes(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let generated = state.notes.generate(&payload.url, None).await.map_err(|e| {
        warn!(error = %e, "preview generation failed");
        e
    })?;
    Ok(Json(generated.into()))
}
