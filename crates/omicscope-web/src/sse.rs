//! Server-Sent Events (SSE) stream of chat activity for the caller's session.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum_extra::{headers::Cookie, TypedHeader};
use futures_core::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::session::session_id_from;
use crate::state::{SessionEvent, SharedState};

/// Name and JSON body of the SSE frame for `scoped`, or `None` when the event
/// belongs to another session.
fn frame_for(session: Uuid, scoped: &SessionEvent) -> Option<(&'static str, String)> {
    if scoped.session_id != session {
        return None;
    }
    let data = serde_json::to_string(&scoped.event).ok()?;
    Some((scoped.event.kind(), data))
}

/// SSE endpoint. Only callers with a live session get a stream, and it
/// carries that session's events alone.
pub async fn sse_handler(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let Some(session) = session_id_from(cookie.as_ref().map(|c| &c.0)) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if state.sessions.get(session).await.is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let rx = state.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let scoped = result.ok()?;
        frame_for(session, &scoped).map(|(kind, data)| Ok(Event::default().event(kind).data(data)))
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}
