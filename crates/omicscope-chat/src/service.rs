//! Chat pipeline: route → translate → append.

use std::sync::Arc;

use chrono::Utc;
use omicscope_common::Language;
use omicscope_lang::{translate, TranslateError, Translator};
use omicscope_llm::LlmAuditEntry;
use thiserror::Error;
use tracing::{info, warn};

use crate::router::{QueryRouter, RouteError};
use crate::session::{ChatSession, ChatTurn};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("Translation failed: {0}")]
    Translate(#[from] TranslateError),
}

pub struct ChatService {
    router: QueryRouter,
    translator: Arc<dyn Translator>,
}

impl ChatService {
    pub fn new(router: QueryRouter, translator: Arc<dyn Translator>) -> Self {
        Self { router, translator }
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    /// Answer `query` in `language` and append the turn to `session`.
    ///
    /// A blank query, or an answer that comes back empty, leaves the session
    /// untouched and returns `Ok(None)`. On error nothing is appended.
    pub async fn submit(
        &self,
        session: &mut ChatSession,
        query: &str,
        language: Language,
    ) -> Result<Option<ChatTurn>, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let answer = match self.router.route(query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(session_id = %session.id, "Query failed: {}", e);
                return Err(e.into());
            }
        };

        if let Some(completion) = &answer.completion {
            LlmAuditEntry::new(
                Some(session.id.to_string()),
                completion.backend.clone(),
                &completion.response,
                completion.latency_ms,
            )
            .record();
        }

        if answer.text.trim().is_empty() {
            warn!(session_id = %session.id, intent = answer.intent.as_str(), "Empty answer, turn not recorded");
            return Ok(None);
        }

        let response = translate(self.translator.as_ref(), &answer.text, language).await?;

        let turn = ChatTurn {
            query: query.to_string(),
            response,
            intent: answer.intent,
            language,
            answered_at: Utc::now(),
        };
        session.append(turn.clone());

        info!(
            session_id = %session.id,
            intent = turn.intent.as_str(),
            language = %language,
            turns = session.len(),
            "Chat turn recorded"
        );
        Ok(Some(turn))
    }
}
