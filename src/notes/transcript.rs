use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One timed caption line.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFragment {
    pub text: String,
    pub offset_secs: f64,
    pub duration_secs: f64,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Caption fragments in playback order; empty when the video has none.
    async fn fetch(&self, video_id: &str) -> anyhow::Result<Vec<CaptionFragment>>;
}

pub fn join_fragments(fragments: &[CaptionFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
struct CaptionsBlock {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct TracklistRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: Option<String>,
}

/// Scrapes caption tracks from the public watch page.
#[derive(Clone)]
pub struct YoutubeTranscripts {
    client: reqwest::Client,
    language: String,
}

impl YoutubeTranscripts {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("build transcript http client")?;
        Ok(Self {
            client,
            language: "en".into(),
        })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT_LANGUAGE, self.language.as_str())
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("Request failed with status: {}", response.status());
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, video_id: &str) -> anyhow::Result<Vec<CaptionFragment>> {
        let page = self
            .get_text(WATCH_URL, &[("v", video_id)])
            .await
            .context("fetch watch page")?;

        let tracks = caption_tracks(&page)?;
        let Some(track) = pick_track(&tracks, &self.language) else {
            debug!(%video_id, "video has no caption tracks");
            return Ok(Vec::new());
        };

        let xml = self
            .get_text(&track.base_url, &[])
            .await
            .context("fetch caption track")?;
        let fragments = parse_timed_text(&xml);
        debug!(%video_id, fragments = fragments.len(), "transcript fetched");
        Ok(fragments)
    }
}

fn caption_tracks(page: &str) -> anyhow::Result<Vec<CaptionTrack>> {
    let Some((_, after)) = page.split_once("\"captions\":") else {
        if page.contains("class=\"g-recaptcha\"") {
            anyhow::bail!("YouTube is rate limiting transcript requests");
        }
        return Ok(Vec::new());
    };
    let block = after.split(",\"videoDetails").next().unwrap_or(after);
    let captions: CaptionsBlock =
        serde_json::from_str(&block.replace('\n', "")).context("parse captions block")?;
    Ok(captions
        .renderer
        .map(|r| r.caption_tracks)
        .unwrap_or_default())
}

fn pick_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| {
            t.language_code
                .as_deref()
                .is_some_and(|code| code.starts_with(language))
        })
        .or_else(|| tracks.first())
}

fn parse_timed_text(xml: &str) -> Vec<CaptionFragment> {
    lazy_static! {
        static ref TEXT_RE: Regex =
            Regex::new(r#"(?s)<text start="([^"]*)" dur="([^"]*)"[^>]*>(.*?)</text>"#).unwrap();
    }
    TEXT_RE
        .captures_iter(xml)
        .map(|c| CaptionFragment {
            text: decode_entities(&c[3]),
            offset_secs: c[1].parse().unwrap_or_default(),
            duration_secs: c[2].parse().unwrap_or_default(),
        })
        .filter(|f| !f.text.is_empty())
        .collect()
}

/// Caption XML is entity-encoded, sometimes twice (`&amp;#39;`).
fn decode_entities(raw: &str) -> String {
    lazy_static! {
        static ref NUMERIC_RE: Regex = Regex::new(r"&#(x?)([0-9a-fA-F]+);").unwrap();
    }
    let once = raw.replace("&amp;", "&");
    let named = once
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'");
    NUMERIC_RE
        .replace_all(&named, |c: &regex::Captures| {
            let radix = if c[1].is_empty() { 10 } else { 16 };
            u32::from_str_radix(&c[2], radix)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| c[0].to_string())
        })
        .replace('\n', " ")
        .trim()
        .to_owned()
}
