//! Voice question transcription.
//!
//! Failures are typed so the caller can tell "nothing was said" apart from
//! "the service could not be reached".

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::WavClip;

/// Endpoint of the Chromium speech API.
pub const GOOGLE_SPEECH_URL: &str = "http://www.google.com/speech-api/v2/recognize";

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),
    #[error("No speech detected")]
    NoSpeech,
    #[error("Speech service unreachable: {0}")]
    Unreachable(String),
    #[error("Speech API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to store audio clip: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscriptionError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            TranscriptionError::InvalidAudio(_) => "invalid_audio",
            TranscriptionError::NoSpeech        => "no_speech",
            TranscriptionError::Unreachable(_)  => "unreachable",
            TranscriptionError::Api { .. }      => "api_error",
            TranscriptionError::Io(_)           => "io",
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &WavClip) -> Result<String, TranscriptionError>;
}

pub struct GoogleSpeechTranscriber {
    endpoint: String,
    language: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GoogleSpeechTranscriber {
    pub fn new(language: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_endpoint(GOOGLE_SPEECH_URL, language, api_key)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        language: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            language: language.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechTranscriber {
    async fn transcribe(&self, clip: &WavClip) -> Result<String, TranscriptionError> {
        if clip.samples().is_empty() || clip.is_silent() {
            return Err(TranscriptionError::NoSpeech);
        }

        let mut query = vec![
            ("client", "chromium".to_string()),
            ("lang", self.language.clone()),
            ("output", "json".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, format!("audio/l16; rate={}", clip.sample_rate))
            .body(clip.to_l16_be())
            .send()
            .await
            .map_err(|e| TranscriptionError::Unreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TranscriptionError::Unreachable(e.to_string()))?;
        if status >= 400 {
            return Err(TranscriptionError::Api { status, message: body });
        }

        best_transcript(&body).ok_or(TranscriptionError::NoSpeech)
    }
}

/// The response is one JSON object per line; the first line is usually an
/// empty `{"result":[]}`. Picks the most confident alternative of the first
/// non-empty result.
fn best_transcript(body: &str) -> Option<String> {
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(json) = serde_json::from_str::<serde_json::Value>(line) else {
            debug!("Skipping unparseable speech response line");
            continue;
        };
        let Some(alternatives) = json["result"]
            .as_array()
            .and_then(|r| r.first())
            .and_then(|r| r["alternative"].as_array())
        else {
            continue;
        };

        let best = alternatives
            .iter()
            .filter(|a| a["transcript"].as_str().is_some_and(|t| !t.trim().is_empty()))
            .max_by(|a, b| {
                let ca = a["confidence"].as_f64().unwrap_or(0.0);
                let cb = b["confidence"].as_f64().unwrap_or(0.0);
                ca.total_cmp(&cb)
            })?;
        return best["transcript"].as_str().map(|t| t.trim().to_string());
    }
    None
}

/// Voice capture pipeline: validate the uploaded clip, keep a copy at the
/// transient clip path, then transcribe it.
pub struct VoiceInput {
    transcriber: Arc<dyn Transcriber>,
    clip_path: PathBuf,
}

impl VoiceInput {
    pub fn new(transcriber: Arc<dyn Transcriber>, clip_path: impl Into<PathBuf>) -> Self {
        Self { transcriber, clip_path: clip_path.into() }
    }

    pub fn clip_path(&self) -> &std::path::Path {
        &self.clip_path
    }

    pub async fn transcribe_upload(&self, bytes: &[u8]) -> Result<String, TranscriptionError> {
        let clip = WavClip::parse(bytes)?;
        clip.persist(&self.clip_path).await?;
        debug!(
            path = %self.clip_path.display(),
            seconds = clip.duration_secs(),
            "Stored voice clip"
        );

        match self.transcriber.transcribe(&clip).await {
            Ok(text) => {
                info!(chars = text.len(), "Voice query transcribed");
                Ok(text)
            }
            Err(e) => {
                warn!(reason = e.reason(), "Could not recognize audio: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::post, Router};

    use super::*;
    use crate::audio::tests::wav_bytes;

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/speech-api/v2/recognize", addr)
    }

    fn speech_clip() -> WavClip {
        WavClip::parse(&wav_bytes(1, 16_000, 16, &[120, -340, 560, -780])).unwrap()
    }

    #[test]
    fn test_best_transcript_skips_empty_result_line() {
        let body = "{\"result\":[]}\n{\"result\":[{\"alternative\":[{\"transcript\":\"vital status\",\"confidence\":0.61},{\"transcript\":\"what is vital status\",\"confidence\":0.93}],\"final\":true}],\"result_index\":0}\n";
        assert_eq!(best_transcript(body).as_deref(), Some("what is vital status"));
        assert_eq!(best_transcript("{\"result\":[]}\n"), None);
    }

    #[tokio::test]
    async fn test_transcribe_against_stub() {
        let app = Router::new().route(
            "/speech-api/v2/recognize",
            post(|headers: axum::http::HeaderMap, body: axum::body::Bytes| async move {
                let ctype = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if ctype != "audio/l16; rate=16000" || body.len() != 8 {
                    return (StatusCode::BAD_REQUEST, "bad audio".to_string());
                }
                (
                    StatusCode::OK,
                    "{\"result\":[]}\n{\"result\":[{\"alternative\":[{\"transcript\":\"show receptor status\"}],\"final\":true}]}\n"
                        .to_string(),
                )
            }),
        );
        let endpoint = spawn_stub(app).await;

        let t = GoogleSpeechTranscriber::with_endpoint(endpoint, "en-US", None);
        assert_eq!(t.transcribe(&speech_clip()).await.unwrap(), "show receptor status");
    }

    #[tokio::test]
    async fn test_no_speech_and_api_errors_are_distinct() {
        let app = Router::new()
            .route("/speech-api/v2/recognize", post(|| async { "{\"result\":[]}\n" }));
        let endpoint = spawn_stub(app).await;
        let t = GoogleSpeechTranscriber::with_endpoint(endpoint, "en-US", None);
        assert!(matches!(t.transcribe(&speech_clip()).await, Err(TranscriptionError::NoSpeech)));

        let app = Router::new().route(
            "/speech-api/v2/recognize",
            post(|| async { (StatusCode::FORBIDDEN, "quota exceeded") }),
        );
        let endpoint = spawn_stub(app).await;
        let t = GoogleSpeechTranscriber::with_endpoint(endpoint, "en-US", Some("k".into()));
        let err = t.transcribe(&speech_clip()).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::Api { status: 403, .. }));
        assert_eq!(err.reason(), "api_error");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let t = GoogleSpeechTranscriber::with_endpoint(format!("http://{addr}/recognize"), "en-US", None);
        let err = t.transcribe(&speech_clip()).await.unwrap_err();
        assert_eq!(err.reason(), "unreachable");
    }

    #[tokio::test]
    async fn test_silent_clip_never_reaches_service() {
        let silent = WavClip::parse(&wav_bytes(1, 16_000, 16, &[0, 0, 0])).unwrap();
        let t = GoogleSpeechTranscriber::with_endpoint("http://127.0.0.1:9/unused", "en-US", None);
        assert!(matches!(t.transcribe(&silent).await, Err(TranscriptionError::NoSpeech)));
    }

    #[tokio::test]
    async fn test_voice_input_rejects_garbage_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio_query.wav");
        let transcriber = Arc::new(GoogleSpeechTranscriber::with_endpoint("http://127.0.0.1:9/unused", "en-US", None));
        let voice = VoiceInput::new(transcriber, &path);

        let err = voice.transcribe_upload(b"not audio").await.unwrap_err();
        assert_eq!(err.reason(), "invalid_audio");
        assert!(!path.exists());

        let err = voice.transcribe_upload(&wav_bytes(1, 16_000, 16, &[0, 0])).await.unwrap_err();
        assert_eq!(err.reason(), "no_speech");
        assert!(path.exists());
    }
}
