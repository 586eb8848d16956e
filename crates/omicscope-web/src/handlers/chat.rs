//! Chat endpoints: form and JSON submission, history, session end.

use axum::{
    extract::{Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Redirect},
    Form, Json,
};
use axum_extra::{headers::Cookie, TypedHeader};
use omicscope_chat::ChatTurn;
use omicscope_common::Language;
use serde::Deserialize;
use uuid::Uuid;

use super::{DashboardParams, Toggles};
use crate::error::WebError;
use crate::session::{clear_session_cookie, session_id_from, set_session_cookie};
use crate::state::{AppEvent, AppState, SharedState};

#[derive(Deserialize)]
pub struct ChatForm {
    pub query: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub language: Option<String>,
}

pub(crate) fn parse_language(raw: Option<&str>) -> Result<Language, WebError> {
    match raw {
        Some(raw) => raw.parse().map_err(|e: omicscope_common::OmicError| WebError::BadRequest(e.to_string())),
        None => Ok(Language::default()),
    }
}

/// Run one submission against the caller's session. A caller without a live
/// session gets a fresh one, stored only once a turn lands in it. The session
/// stays locked until the turn is appended.
///
/// Returns the id of the caller's live session, if there is one afterwards.
pub(crate) async fn submit_query(
    state: &AppState,
    session_id: Option<Uuid>,
    query: &str,
    language: Language,
) -> Result<(Option<Uuid>, Option<ChatTurn>), WebError> {
    let (id, handle, live) = state.sessions.resume_or_new(session_id).await;
    let mut session = handle.lock().await;
    let turn = state.chat.submit(&mut session, query, language).await?;

    let Some(turn) = turn else {
        return Ok((live.then_some(id), None));
    };
    if !live {
        state.sessions.register(id, handle.clone()).await;
    }
    state.publish(
        id,
        AppEvent::TurnAppended {
            intent: turn.intent.as_str().to_string(),
            language: turn.language.to_string(),
        },
    );
    Ok((Some(id), Some(turn)))
}

pub(crate) fn session_cookie(id: Option<Uuid>) -> Option<[(HeaderName, HeaderValue); 1]> {
    id.map(|id| [set_session_cookie(id)])
}

/// `POST /chat` - dashboard form; redirects back with the same sidebar state.
/// A failed submission comes back as an `error` reason shown on the page.
pub async fn chat_form(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    Query(params): Query<DashboardParams>,
    Form(form): Form<ChatForm>,
) -> impl IntoResponse {
    let toggles = Toggles::from(&params);
    let session_id = session_id_from(cookie.as_ref().map(|c| &c.0));
    let back = format!("/?{}", toggles.query_string());

    match submit_query(&state, session_id, &form.query, toggles.language).await {
        Ok((id, _)) => (session_cookie(id), Redirect::to(&back)),
        Err(e) => {
            tracing::warn!(reason = e.reason(), "Chat form submission failed: {}", e);
            let id = match session_id {
                Some(id) => state.sessions.get(id).await.map(|_| id),
                None => None,
            };
            (session_cookie(id), Redirect::to(&format!("{back}&error={}", e.reason())))
        }
    }
}

/// `POST /api/chat` - returns the new turn, or `null` when nothing was recorded.
pub async fn api_chat(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, WebError> {
    let language = parse_language(req.language.as_deref())?;
    let session_id = session_id_from(cookie.as_ref().map(|c| &c.0));
    let (id, turn) = submit_query(&state, session_id, &req.query, language).await?;

    Ok((session_cookie(id), Json(turn)))
}

/// `GET /api/history` - the caller's turns in submission order.
pub async fn api_history(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Json<Vec<ChatTurn>> {
    let Some(id) = session_id_from(cookie.as_ref().map(|c| &c.0)) else {
        return Json(Vec::new());
    };
    match state.sessions.get(id).await {
        Some(handle) => Json(handle.lock().await.history().to_vec()),
        None => Json(Vec::new()),
    }
}

/// `POST /session/end` - discard the session and clear its cookie.
pub async fn end_session(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    if let Some(id) = session_id_from(cookie.as_ref().map(|c| &c.0)) {
        if state.sessions.end(id).await {
            state.publish(id, AppEvent::SessionEnded);
        }
    }
    let toggles = Toggles::from(&params);
    ([clear_session_cookie()], Redirect::to(&format!("/?{}", toggles.query_string())))
}
