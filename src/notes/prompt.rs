pub const TRUNCATION_MARKER: &str = "...[truncated]";

const FORMAT_RULES: &str = "\
Format the output in clean Markdown:
- Use H1 (#) for the main title (create a catchy title based on content).
- Use H2 (##) for section headers.
- Use bullet points for key concepts.
- Highlight important terms in **bold**.
- Include a \"Summary\" section at the top.
- Include a \"Key Takeaways\" section at the bottom.";

/// Cut `text` to at most `max_chars` characters, appending the marker when cut.
pub fn truncate_transcript(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_owned(),
    }
}

pub fn transcript_prompt(transcript: &str) -> String {
    format!(
        "You are an expert student assistant. Your task is to create comprehensive study notes \
         from the following YouTube video transcript.\n\n{FORMAT_RULES}\n\nTranscript:\n\"{transcript}\"\n"
    )
}

pub fn video_prompt(url: &str) -> String {
    format!(
        "You are an expert student assistant. Watch the attached YouTube video and create \
         comprehensive study notes from it.\n\n{FORMAT_RULES}\n\nVideo: {url}\n"
    )
}

/// Text of the first `# ` heading line, if any.
pub fn extract_title(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .map(str::trim_start)
        .find_map(|line| {
            line.strip_prefix("# ")
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map(str::to_owned)
}

pub fn fallback_title(video_id: &str) -> String {
    format!("Study Notes ({video_id})")
}
