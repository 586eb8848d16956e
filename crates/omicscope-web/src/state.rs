//! Shared application state for the web server.

use std::sync::Arc;

use omicscope_chat::{ChatService, SessionStore};
use omicscope_data::{columns, Dataset};
use omicscope_lang::VoiceInput;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events pushed to connected clients via SSE. The payload never names a
/// session; a stream only carries events of its own session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A chat turn was recorded
    TurnAppended { intent: String, language: String },
    /// A voice clip could not be turned into a query
    TranscriptionFailed { reason: String, message: String },
    /// The session was discarded
    SessionEnded,
}

impl AppEvent {
    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppEvent::TurnAppended { .. }        => "turn_appended",
            AppEvent::TranscriptionFailed { .. } => "transcription_failed",
            AppEvent::SessionEnded               => "session_ended",
        }
    }
}

/// An event together with the session it belongs to.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub event: AppEvent,
}

/// Panel knobs read from configuration.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub sample_rows: usize,
    pub gene_prefix: String,
    pub heatmap_max_columns: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            sample_rows: 5,
            gene_prefix: columns::GENE_EXPRESSION_PREFIX.to_string(),
            heatmap_max_columns: 40,
        }
    }
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub dataset_name: String,
    pub chat: ChatService,
    pub voice: VoiceInput,
    pub sessions: SessionStore,
    pub settings: DashboardSettings,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<SessionEvent>,
}

impl AppState {
    pub fn new(
        dataset: Arc<Dataset>,
        dataset_name: impl Into<String>,
        chat: ChatService,
        voice: VoiceInput,
        settings: DashboardSettings,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            dataset,
            dataset_name: dataset_name.into(),
            chat,
            voice,
            sessions: SessionStore::new(),
            settings,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Send to every subscriber; dropped silently when nobody listens.
    pub fn publish(&self, session_id: Uuid, event: AppEvent) {
        let _ = self.event_tx.send(SessionEvent { session_id, event });
    }
}

pub type SharedState = Arc<AppState>;
