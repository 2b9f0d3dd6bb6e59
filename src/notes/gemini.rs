use anyhow::Context;
use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::GenerationConfig;

#[async_trait]
pub trait NoteGenerator: Send + Sync {
    /// Run the model on `prompt`, optionally attaching a media URL.
    async fn generate(&self, prompt: &str, media_url: Option<&str>) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// `generateContent` client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.upstream_timeout())
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl NoteGenerator for GeminiClient {
    #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str, media_url: Option<&str>) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("Gemini API key is missing. Please add GEMINI_API_KEY to your environment.");
        };

        let mut parts = Vec::with_capacity(2);
        if let Some(uri) = media_url {
            parts.push(Part::File {
                file_data: FileData { file_uri: uri },
            });
        }
        parts.push(Part::Text { text: prompt });
        let request = GenerateRequest {
            contents: vec![Content { role: "user", parts }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Request failed with status: {status}"));
            anyhow::bail!(message);
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("decode generateContent response")?;
        let text = parsed.text();
        debug!(response_chars = text.len(), "gemini responded");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_puts_media_before_prompt() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            file_uri: "https://youtu.be/dQw4w9WgXcQ",
                        },
                    },
                    Part::Text { text: "summarise" },
                ],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["contents"][0]["parts"][0]["fileData"]["fileUri"],
            "https://youtu.be/dQw4w9WgXcQ"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "summarise");
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let body = r##"{"candidates":[{"content":{"parts":[{"text":"# Title\n"},{"text":"body"}],"role":"model"}},{"content":{"parts":[{"text":"ignored"}]}}]}"##;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), "# Title\nbody");
    }

    #[test]
    fn blocked_response_has_no_text() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(&GenerationConfig {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            base_url: "http://127.0.0.1:9".into(),
            source_mode: crate::config::SourceMode::Transcript,
            max_transcript_chars: 100,
            upstream_timeout_secs: 1,
        })
        .unwrap();
        let err = client.generate("prompt", None).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
