mod dto;
pub mod gemini;
pub mod handlers;
pub mod prompt;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod transcript;
pub mod video;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::owner_routes())
        .merge(handlers::preview_routes())
}
