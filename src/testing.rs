//! In-memory stores and deterministic upstream fakes for unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo::AccountStore;
use crate::accounts::repo_types::{Account, NewAccount, Role, Status};
use crate::accounts::services::AccountDirectory;
use crate::auth::password::CredentialHasher;
use crate::config::{AppConfig, GenerationConfig, JwtConfig, SourceMode};
use crate::error::AppError;
use crate::notes::gemini::NoteGenerator;
use crate::notes::repo::NoteStore;
use crate::notes::repo_types::{NewNote, Note};
use crate::notes::services::{NoteOrchestrator, OrchestratorSettings};
use crate::notes::transcript::{CaptionFragment, TranscriptSource};
use crate::state::AppState;

/// Fast reversible "hash" so tests don't pay for argon2.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        Ok(format!("plain${plain}"))
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let stored = hash
            .strip_prefix("plain$")
            .ok_or_else(|| anyhow::anyhow!("not a plain hash"))?;
        Ok(stored == plain)
    }
}

/// `PlainHasher` that counts verification calls.
#[derive(Default)]
pub struct CountingHasher {
    verifies: AtomicUsize,
}

impl CountingHasher {
    pub fn verifies(&self) -> usize {
        self.verifies.load(Ordering::SeqCst)
    }
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        PlainHasher.hash(plain)
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        PlainHasher.verify(plain, hash)
    }
}

/// Strictly increasing timestamps so ordering tests never tie.
fn tick(counter: &AtomicUsize) -> OffsetDateTime {
    let n = counter.fetch_add(1, Ordering::SeqCst) as i64;
    OffsetDateTime::UNIX_EPOCH + time::Duration::days(19_000) + time::Duration::milliseconds(n)
}

#[derive(Default)]
pub struct MemoryAccountStore {
    rows: Mutex<Vec<Account>>,
    clock: AtomicUsize,
}

impl MemoryAccountStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, new: NewAccount) -> Result<Account, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.email == new.email) {
            return Err(AppError::Conflict);
        }
        let account = Account {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            status: new.status,
            created_at: tick(&self.clock),
        };
        rows.push(account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Account>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    async fn update_status(&self, id: Uuid, status: Status) -> anyhow::Result<Option<Account>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|a| a.id == id).map(|a| {
            a.status = status;
            a.clone()
        }))
    }

    async fn grant_admin(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<Account>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|a| a.email == email).map(|a| {
            a.password_hash = password_hash.to_owned();
            a.role = Role::Admin;
            a.status = Status::Approved;
            a.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryNoteStore {
    rows: Mutex<Vec<Note>>,
    clock: AtomicUsize,
}

impl MemoryNoteStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, new: NewNote) -> anyhow::Result<Note> {
        let now = tick(&self.clock);
        let note = Note {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            video_url: new.video_url,
            video_id: new.video_id,
            title: new.title,
            content: new.content,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(note.clone());
        Ok(note)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> anyhow::Result<Vec<Note>> {
        let mut rows: Vec<Note> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn delete_by_owner(&self, note_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| !(n.id == note_id && n.user_id == user_id));
        Ok(rows.len() != before)
    }
}

pub struct FakeTranscripts {
    reply: Result<Vec<CaptionFragment>, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_video_id: Mutex<Option<String>>,
}

impl FakeTranscripts {
    pub fn with_text(lines: &[&str]) -> Self {
        let fragments = lines
            .iter()
            .enumerate()
            .map(|(i, text)| CaptionFragment {
                text: text.to_string(),
                offset_secs: i as f64,
                duration_secs: 1.0,
            })
            .collect();
        Self::new(Ok(fragments))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_owned()))
    }

    fn new(reply: Result<Vec<CaptionFragment>, String>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_video_id: Mutex::new(None),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_video_id(&self) -> Option<String> {
        self.last_video_id.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch(&self, video_id: &str) -> anyhow::Result<Vec<CaptionFragment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_video_id.lock().unwrap() = Some(video_id.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(|m| anyhow::anyhow!(m))
    }
}

pub struct FakeGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_call: Mutex<Option<(String, Option<String>)>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self::new(Ok(text.to_owned()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Err(message.to_owned()))
    }

    fn new(reply: Result<String, String>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<(String, Option<String>)> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, media_url: Option<&str>) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((prompt.to_owned(), media_url.map(str::to_owned)));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(|m| anyhow::anyhow!(m))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "studyportal-test".into(),
            audience: "studyportal-test-users".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        generation: GenerationConfig {
            api_key: None,
            model: "test-model".into(),
            base_url: "http://127.0.0.1:9".into(),
            source_mode: SourceMode::Transcript,
            max_transcript_chars: 1_000,
            upstream_timeout_secs: 5,
        },
        admin: None,
    }
}

/// Full application state over memory stores and the given upstream fakes.
pub fn test_state(transcripts: FakeTranscripts, generator: FakeGenerator) -> AppState {
    let config = test_config();
    let directory = AccountDirectory::new(
        Arc::new(MemoryAccountStore::default()),
        Arc::new(PlainHasher),
    );
    let notes = NoteOrchestrator::new(
        Arc::new(transcripts),
        Arc::new(generator),
        Arc::new(MemoryNoteStore::default()),
        OrchestratorSettings::from(&config.generation),
    );
    AppState::from_parts(Arc::new(config), directory, notes)
}
