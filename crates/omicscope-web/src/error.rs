//! Request failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use omicscope_chat::{ChatError, RouteError};
use omicscope_lang::TranscriptionError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("Could not recognize audio: {0}")]
    Transcription(#[from] TranscriptionError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Chat(ChatError::Route(RouteError::Llm(_))) => StatusCode::BAD_GATEWAY,
            WebError::Chat(ChatError::Translate(_))              => StatusCode::BAD_GATEWAY,
            WebError::Chat(_)                                    => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Transcription(TranscriptionError::Io(_))   => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Transcription(_)                           => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::BadRequest(_)                              => StatusCode::BAD_REQUEST,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            WebError::Chat(ChatError::Route(RouteError::Dataset(_))) => "dataset",
            WebError::Chat(ChatError::Route(RouteError::Llm(_)))     => "llm",
            WebError::Chat(ChatError::Route(RouteError::NoRule))     => "no_rule",
            WebError::Chat(ChatError::Translate(_))                  => "translation",
            WebError::Transcription(e)                               => e.reason(),
            WebError::BadRequest(_)                                  => "bad_request",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(reason = self.reason(), "Request failed: {}", self);
        } else {
            tracing::warn!(reason = self.reason(), "Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string(), "reason": self.reason() }))).into_response()
    }
}
