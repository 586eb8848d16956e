//! Axum router - maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    chat::{api_chat, api_history, chat_form, end_session},
    dashboard::dashboard,
    voice::api_voice,
};
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Upper bound for uploaded voice clips.
pub const MAX_CLIP_BYTES: usize = 16 * 1024 * 1024;

/// Build and return the full Axum router. Accepts the state itself or an
/// already shared handle to it.
pub fn build_router(state: impl Into<SharedState>) -> Router {
    let shared: SharedState = state.into();

    Router::new()
        // Pages
        .route("/",            get(dashboard))
        .route("/chat",        post(chat_form))
        .route("/session/end", post(end_session))

        // SSE streaming
        .route("/api/events",  get(sse_handler))

        // API endpoints
        .route("/api/chat",    post(api_chat))
        .route("/api/history", get(api_history))
        .route(
            "/api/voice",
            post(api_voice).layer(DefaultBodyLimit::max(MAX_CLIP_BYTES)),
        )

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
