use std::sync::Arc;

mod accounts;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod notes;
mod state;
#[cfg(test)]
mod testing;

use crate::config::AppConfig;
use crate::db::Database;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "studyportal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    if config.generation.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; note generation will fail");
    }

    let db = Database::connect(&config).await?;
    db.migrate().await?;

    let state = AppState::init(config.clone(), &db)?;
    if let Some(seed) = &config.admin {
        let admin = state.directory.provision_admin(seed).await?;
        tracing::info!(admin_id = %admin.id, "admin account provisioned");
    }

    let result = app::serve(app::build_app(state)).await;
    db.close().await;
    result
}
