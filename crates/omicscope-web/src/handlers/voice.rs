//! Voice questions: a WAV upload is transcribed, then answered like text.

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::Cookie, TypedHeader};
use omicscope_chat::ChatTurn;
use serde::{Deserialize, Serialize};

use super::chat::{parse_language, session_cookie, submit_query};
use crate::error::WebError;
use crate::session::session_id_from;
use crate::state::{AppEvent, SharedState};

#[derive(Deserialize)]
pub struct VoiceParams {
    pub language: Option<String>,
}

#[derive(Serialize)]
pub struct VoiceReply {
    pub transcript: String,
    pub turn: Option<ChatTurn>,
}

/// `POST /api/voice` - raw WAV body. A clip that cannot be transcribed is
/// rejected with its reason and never reaches the router.
pub async fn api_voice(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    Query(params): Query<VoiceParams>,
    body: Bytes,
) -> Result<impl IntoResponse, WebError> {
    let language = parse_language(params.language.as_deref())?;
    let session_id = session_id_from(cookie.as_ref().map(|c| &c.0));

    let transcript = match state.voice.transcribe_upload(&body).await {
        Ok(text) => text,
        Err(e) => {
            if let Some(id) = session_id {
                state.publish(
                    id,
                    AppEvent::TranscriptionFailed {
                        reason: e.reason().to_string(),
                        message: e.to_string(),
                    },
                );
            }
            return Err(e.into());
        }
    };

    let (id, turn) = submit_query(&state, session_id, &transcript, language).await?;
    Ok((session_cookie(id), Json(VoiceReply { transcript, turn })))
}
