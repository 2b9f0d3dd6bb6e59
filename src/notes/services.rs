use std::{future::Future, sync::Arc, time::Duration};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{GenerationConfig, SourceMode};
use crate::error::AppError;
use crate::notes::gemini::NoteGenerator;
use crate::notes::prompt::{
    extract_title, fallback_title, transcript_prompt, truncate_transcript, video_prompt,
};
use crate::notes::repo::NoteStore;
use crate::notes::repo_types::{NewNote, Note};
use crate::notes::transcript::{join_fragments, TranscriptSource};
use crate::notes::video::VideoRef;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub source_mode: SourceMode,
    pub max_transcript_chars: usize,
    pub upstream_timeout: Duration,
}

impl From<&GenerationConfig> for OrchestratorSettings {
    fn from(c: &GenerationConfig) -> Self {
        Self {
            source_mode: c.source_mode,
            max_transcript_chars: c.max_transcript_chars,
            upstream_timeout: c.upstream_timeout(),
        }
    }
}

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct GeneratedNotes {
    pub video_id: String,
    pub title: String,
    pub content: String,
    /// Present when an owner was supplied and the row was written.
    pub note: Option<Note>,
}

/// Runs URL -> source -> model -> title -> row for a single request.
#[derive(Clone)]
pub struct NoteOrchestrator {
    transcripts: Arc<dyn TranscriptSource>,
    generator: Arc<dyn NoteGenerator>,
    notes: Arc<dyn NoteStore>,
    settings: OrchestratorSettings,
}

async fn within<T, F>(limit: Duration, fut: F) -> Option<anyhow::Result<T>>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(limit, fut).await.ok()
}

impl NoteOrchestrator {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        generator: Arc<dyn NoteGenerator>,
        notes: Arc<dyn NoteStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            transcripts,
            generator,
            notes,
            settings,
        }
    }

    #[instrument(skip(self), fields(mode = ?self.settings.source_mode))]
    pub async fn generate(
        &self,
        video_url: &str,
        owner: Option<Uuid>,
    ) -> Result<GeneratedNotes, AppError> {
        if video_url.trim().is_empty() {
            return Err(AppError::InvalidReference);
        }
        let video = VideoRef::parse(video_url)?;

        let (prompt, media_url) = match self.settings.source_mode {
            SourceMode::Transcript => {
                let transcript = self.fetch_transcript(&video.id).await?;
                let transcript =
                    truncate_transcript(&transcript, self.settings.max_transcript_chars);
                (transcript_prompt(&transcript), None)
            }
            SourceMode::Video => (video_prompt(&video.url), Some(video.url.as_str())),
        };

        let content = self.call_generator(&prompt, media_url).await?;
        let title = extract_title(&content).unwrap_or_else(|| fallback_title(&video.id));

        let note = match owner {
            Some(user_id) => {
                let note = self
                    .notes
                    .insert(NewNote {
                        user_id,
                        video_url: video.url.clone(),
                        video_id: video.id.clone(),
                        title: title.clone(),
                        content: content.clone(),
                    })
                    .await?;
                info!(note_id = %note.id, %user_id, video_id = %video.id, "study notes saved");
                Some(note)
            }
            None => {
                info!(video_id = %video.id, "study notes previewed");
                None
            }
        };

        Ok(GeneratedNotes {
            video_id: video.id,
            title,
            content,
            note,
        })
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<String, AppError> {
        let limit = self.settings.upstream_timeout;
        let fragments = match within(limit, self.transcripts.fetch(video_id)).await {
            Some(Ok(fragments)) => fragments,
            Some(Err(e)) => {
                warn!(error = %e, %video_id, "transcript fetch failed");
                return Err(AppError::NoTranscript);
            }
            None => {
                warn!(%video_id, timeout_secs = limit.as_secs(), "transcript fetch timed out");
                return Err(AppError::NoTranscript);
            }
        };

        let transcript = join_fragments(&fragments);
        if transcript.trim().is_empty() {
            return Err(AppError::NoTranscript);
        }
        Ok(transcript)
    }

    async fn call_generator(
        &self,
        prompt: &str,
        media_url: Option<&str>,
    ) -> Result<String, AppError> {
        let limit = self.settings.upstream_timeout;
        let text = match within(limit, self.generator.generate(prompt, media_url)).await {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                warn!(error = %e, "generation failed");
                return Err(AppError::GenerationFailed(e.to_string()));
            }
            None => {
                return Err(AppError::GenerationFailed(format!(
                    "timed out after {}s",
                    limit.as_secs()
                )))
            }
        };

        if text.trim().is_empty() {
            return Err(AppError::GenerationFailed("the model returned no text".into()));
        }
        Ok(text)
    }

    pub async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Note>, AppError> {
        Ok(self.notes.list_by_owner(owner).await?)
    }

    /// Owner-scoped delete; a note owned by someone else is left alone.
    pub async fn delete_for_owner(&self, note_id: Uuid, owner: Uuid) -> Result<bool, AppError> {
        let deleted = self.notes.delete_by_owner(note_id, owner).await?;
        if deleted {
            info!(%note_id, user_id = %owner, "study note deleted");
        } else {
            warn!(%note_id, user_id = %owner, "delete matched no owned note");
        }
        Ok(deleted)
    }
}
