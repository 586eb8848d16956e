//! Answer translation through the public Google Translate endpoint.

use async_trait::async_trait;
use omicscope_common::Language;
use thiserror::Error;
use tracing::debug;

/// Default endpoint of the keyless `gtx` translation API.
pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// The service rejects longer inputs.
pub const MAX_CHUNK_CHARS: usize = 5000;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Translation API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected translation response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `target_code`,
    /// detecting the source language.
    async fn translate_to(&self, text: &str, target_code: &str) -> Result<String, TranslateError>;
}

/// Translate `text` into `target`. The default language is the identity and
/// never reaches the service.
pub async fn translate(
    translator: &dyn Translator,
    text: &str,
    target: Language,
) -> Result<String, TranslateError> {
    if target.is_default() || text.trim().is_empty() {
        return Ok(text.to_string());
    }
    translator.translate_to(text, target.code()).await
}

pub struct GoogleTranslator {
    endpoint: String,
    client: reqwest::Client,
}

impl GoogleTranslator {
    pub fn new() -> Self {
        Self::with_endpoint(GOOGLE_TRANSLATE_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), client: reqwest::Client::new() }
    }

    async fn translate_chunk(&self, chunk: &str, target_code: &str) -> Result<String, TranslateError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code),
                ("dt", "t"),
                ("q", chunk),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status >= 400 {
            return Err(TranslateError::Api { status, message: body });
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;
        parse_gtx_response(&json)
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_to(&self, text: &str, target_code: &str) -> Result<String, TranslateError> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        debug!(target_code, chunks = chunks.len(), "Translating answer");

        let mut out = String::with_capacity(text.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 && !chunk.mid_line {
                out.push('\n');
            }
            out.push_str(&self.translate_chunk(&chunk.text, target_code).await?);
        }
        Ok(out)
    }
}

/// The `gtx` response is a nested array whose first element lists
/// `[translated, original, …]` segments.
fn parse_gtx_response(json: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = json
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| TranslateError::Malformed("missing segment list".to_string()))?;

    Ok(segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect())
}

/// A piece of the input sent in one request.
#[derive(Debug, PartialEq)]
struct Chunk {
    text: String,
    /// Continues the previous chunk's line, so no line break goes between them.
    mid_line: bool,
}

impl Chunk {
    fn new(text: String, mid_line: bool) -> Self {
        Self { text, mid_line }
    }
}

/// Split on line boundaries into chunks of at most `max_chars` characters.
/// Single lines longer than the limit are split mid-line.
fn split_chunks(text: &str, max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed > max_chars && !current.is_empty() {
            chunks.push(Chunk::new(std::mem::take(&mut current), false));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for (i, piece) in chars.chunks(max_chars).enumerate() {
                chunks.push(Chunk::new(piece.iter().collect(), i > 0));
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(current, false));
    }
    chunks
}
