use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

const VIDEO_ID_LEN: usize = 11;

/// A YouTube link together with the id pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub url: String,
    pub id: String,
}

impl VideoRef {
    pub fn parse(url: &str) -> Result<Self, AppError> {
        let url = url.trim();
        let id = extract_video_id(url).ok_or(AppError::InvalidReference)?;
        Ok(Self {
            url: url.to_owned(),
            id: id.to_owned(),
        })
    }
}

/// Watch, short, embed and legacy `/v/` links; the id must be exactly 11 characters.
pub fn extract_video_id(url: &str) -> Option<&str> {
    lazy_static! {
        static ref VIDEO_RE: Regex =
            Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").unwrap();
    }
    let id = VIDEO_RE.captures(url)?.get(2)?.as_str();
    (id.chars().count() == VIDEO_ID_LEN).then_some(id)
}
