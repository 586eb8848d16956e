//! Dashboard handler - sidebar, toggled panels, chat input and history.

use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::{headers::Cookie, TypedHeader};
use omicscope_chat::ChatTurn;
use omicscope_common::Language;

use super::{escape, panels, DashboardParams, Toggles};
use crate::session::session_id_from;
use crate::state::{AppState, SharedState};

const STYLE: &str = r#"
    body { margin: 0; font-family: system-ui, sans-serif; color: #222; display: flex; }
    .sidebar { width: 280px; min-height: 100vh; background: #f0f2f6; padding: 1.2rem; box-sizing: border-box; }
    .sidebar h3 { font-size: 1rem; margin: 1.4rem 0 .6rem; }
    .sidebar label { display: block; margin: .35rem 0; }
    .main-content { flex: 1; padding: 1.5rem 2.5rem; min-width: 0; }
    .page-title { text-align: center; }
    .card { border: 1px solid #e3e3e3; border-radius: 8px; padding: 1rem 1.2rem; margin-bottom: 1.2rem; }
    .card-title { font-size: 1.2rem; margin: 0 0 .8rem; }
    .table { border-collapse: collapse; font-size: .85rem; }
    .table th, .table td { border-bottom: 1px solid #eee; padding: .25rem .6rem; text-align: left; white-space: nowrap; }
    .num { text-align: right !important; font-variant-numeric: tabular-nums; }
    .scroll-x { overflow-x: auto; }
    .bar { height: 10px; background: #ff4b4b; border-radius: 2px; min-width: 2px; width: 0; }
    .chart { width: 40%; }
    .stack { display: flex; height: 14px; }
    .legend { margin-right: 1rem; font-size: .85rem; }
    .legend i { display: inline-block; width: 10px; height: 10px; margin-right: .3rem; }
    .alert { padding: .6rem .9rem; border-radius: 6px; margin: .5rem 0; }
    .alert-success { background: #e6f6ec; color: #17633a; }
    .alert-danger { background: #fdecea; color: #8a1c12; }
    .text-muted { color: #777; }
    .chat-container { border: 2px solid #ddd; border-radius: 10px; padding: 15px; max-height: 400px; overflow-y: auto; }
    .msg { margin: .5rem 0; white-space: pre-wrap; }
    .msg-user::before { content: "🧑 "; }
    .msg-assistant::before { content: "🤖 "; }
    .chat-input { display: flex; gap: .5rem; margin-top: 1rem; }
    .chat-input input[type=text] { flex: 1; padding: .5rem; }
    pre.json { background: #f7f7f9; padding: .8rem; }
"#;

const VOICE_SCRIPT: &str = r#"
<script>
  document.getElementById('voice-file').addEventListener('change', async (e) => {
    const file = e.target.files[0];
    if (!file) return;
    const status = document.getElementById('voice-status');
    status.className = 'alert';
    status.textContent = 'Generating response...';
    const res = await fetch('/api/voice?language=__LANG__', {
      method: 'POST',
      headers: { 'Content-Type': 'audio/wav' },
      body: file,
    });
    const data = await res.json();
    if (res.ok) {
      location.reload();
    } else {
      status.className = 'alert alert-danger';
      status.textContent = data.error;
    }
  });
</script>"#;

pub async fn dashboard(
    State(state): State<SharedState>,
    cookie: Option<TypedHeader<Cookie>>,
    Query(params): Query<DashboardParams>,
) -> Html<String> {
    let toggles = Toggles::from(&params);

    let history = match session_id_from(cookie.as_ref().map(|c| &c.0)) {
        Some(id) => match state.sessions.get(id).await {
            Some(handle) => handle.lock().await.history().to_vec(),
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    Html(render_dashboard(&state, &toggles, params.error.as_deref(), &history))
}

fn failure_message(reason: &str) -> &'static str {
    match reason {
        "llm"         => "The language model could not be reached. Please try again.",
        "translation" => "The answer could not be translated. Please try again.",
        "dataset"     => "The dataset lacks a column needed to answer this question.",
        _             => "Your message could not be processed.",
    }
}

fn render_failure(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(r#"<div class="alert alert-danger">{}</div>"#, failure_message(reason)),
        None => String::new(),
    }
}

fn render_sidebar(toggles: &Toggles) -> String {
    let options: String = Language::ALL
        .iter()
        .map(|l| {
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                l.as_str(),
                if *l == toggles.language { " selected" } else { "" }
            )
        })
        .collect();

    let checkbox = |(name, on, label): (&str, bool, &str)| {
        format!(
            r#"<label><input type="checkbox" name="{}" value="on"{} onchange="this.form.submit()"> {}</label>"#,
            name,
            if on { " checked" } else { "" },
            label
        )
    };
    let flags = toggles.flags();
    let analytics: String = flags[..6].iter().copied().map(checkbox).collect();
    let voice = checkbox(flags[6]);

    format!(
        r#"
<aside class="sidebar">
    <form method="GET" action="/">
        <h3>🌍 Language Selection</h3>
        <label>Choose response language:
            <select name="lang" onchange="this.form.submit()">{}</select>
        </label>
        <h3>📊 Analytics Flags</h3>
        {}
        <h3>🎤 Voice Input</h3>
        {}
        <noscript><button type="submit">Apply</button></noscript>
    </form>
</aside>"#,
        options, analytics, voice
    )
}

fn render_history(history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let turns: String = history
        .iter()
        .map(|t| {
            format!(
                r#"<div class="msg msg-user">{}</div><div class="msg msg-assistant">{}</div>"#,
                escape(&t.query),
                escape(&t.response)
            )
        })
        .collect();
    format!(
        r#"<section class="card"><h2 class="card-title">Chat History</h2><div class="chat-container">{}</div></section>"#,
        turns
    )
}

fn render_input(toggles: &Toggles) -> String {
    let qs = toggles.query_string();
    let input = if toggles.voice {
        format!(
            r#"<label>Record your question (WAV): <input type="file" id="voice-file" accept="audio/wav,audio/x-wav,.wav"></label>
            <div id="voice-status"></div>{}"#,
            VOICE_SCRIPT.replace("__LANG__", toggles.language.as_str())
        )
    } else {
        format!(
            r#"<form class="chat-input" method="POST" action="/chat?{}">
                <input type="text" name="query" placeholder="Enter your message here..." autocomplete="off" required>
                <button type="submit">Send</button>
            </form>"#,
            escape(&qs)
        )
    };
    format!(
        r#"<section class="card">
        {}
        <form method="POST" action="/session/end?{}"><button type="submit" class="text-muted">End session</button></form>
    </section>"#,
        input,
        escape(&qs)
    )
}

fn render_dashboard(state: &AppState, toggles: &Toggles, failure: Option<&str>, history: &[ChatTurn]) -> String {
    let ds = &state.dataset;
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>OmicScope - Multi-Omics Data Analysis</title>
    <style>{}</style>
</head>
<body>
{}
<main class="main-content">
    <h1 class="page-title">🔬 AI-Driven Multi-Omics Data Analysis &amp; Bot 🤖</h1>
    <div class="alert alert-success">Dataset loaded successfully! <span class="text-muted">{} · {} rows × {} columns</span></div>
    {}
    {}
    {}
    {}
</main>
</body>
</html>"#,
        STYLE,
        render_sidebar(toggles),
        escape(&state.dataset_name),
        ds.row_count(),
        ds.column_count(),
        panels::render_enabled(ds, &state.settings, toggles),
        render_failure(failure),
        render_input(toggles),
        render_history(history),
    )
}
