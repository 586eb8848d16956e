//! Audit record for LLM calls. Only a hash of the output is kept.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::LlmResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub model: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(
        session_id: Option<String>,
        backend: impl Into<String>,
        response: &LlmResponse,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(response.content.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            session_id,
            model: response.model.clone(),
            backend: backend.into(),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    /// Emit the entry on the `omicscope::audit` tracing target.
    pub fn record(&self) {
        tracing::info!(
            target: "omicscope::audit",
            audit_id = %self.id,
            session_id = self.session_id.as_deref().unwrap_or("-"),
            model = %self.model,
            backend = %self.backend,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            latency_ms = self.latency_ms,
            output_hash = %self.output_hash,
            "LLM call"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_hash_is_sha256_hex() {
        let resp = LlmResponse {
            content: "abc".to_string(),
            model: "wizardlm2:7b".to_string(),
            prompt_tokens: 10,
            completion_tokens: 1,
        };
        let entry = LlmAuditEntry::new(Some("s-1".into()), "ollama", &resp, 42);
        assert_eq!(
            entry.output_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(entry.model, "wizardlm2:7b");
        assert_eq!(entry.latency_ms, 42);
    }
}
