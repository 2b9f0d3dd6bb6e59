use serde::{Deserialize, Serialize};

use crate::notes::repo_types::Note;
use crate::notes::services::GeneratedNotes;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub video_id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

impl From<GeneratedNotes> for GenerateResponse {
    fn from(g: GeneratedNotes) -> Self {
        Self {
            video_id: g.video_id,
            title: g.title,
            content: g.content,
            note: g.note,
        }
    }
}
