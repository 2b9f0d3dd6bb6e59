use std::sync::Arc;

use crate::accounts::{repo::PgAccountStore, services::AccountDirectory};
use crate::auth::password::Argon2Hasher;
use crate::config::AppConfig;
use crate::db::Database;
use crate::notes::{
    gemini::GeminiClient,
    repo::PgNoteStore,
    services::{NoteOrchestrator, OrchestratorSettings},
    transcript::YoutubeTranscripts,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: AccountDirectory,
    pub notes: NoteOrchestrator,
}

impl AppState {
    /// Wire the production stores and upstream clients around an open database.
    pub fn init(config: Arc<AppConfig>, db: &Database) -> anyhow::Result<Self> {
        let directory = AccountDirectory::new(
            Arc::new(PgAccountStore::new(db.pool().clone())),
            Arc::new(Argon2Hasher::default()),
        );

        let generation = &config.generation;
        let notes = NoteOrchestrator::new(
            Arc::new(YoutubeTranscripts::new(generation.upstream_timeout())?),
            Arc::new(GeminiClient::new(generation)?),
            Arc::new(PgNoteStore::new(db.pool().clone())),
            OrchestratorSettings::from(generation),
        );

        Ok(Self::from_parts(config, directory, notes))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        directory: AccountDirectory,
        notes: NoteOrchestrator,
    ) -> Self {
        Self {
            config,
            directory,
            notes,
        }
    }
}
