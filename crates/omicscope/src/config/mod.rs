//! Configuration loading for OmicScope.
//! Reads omicscope.toml from the current directory or the path in the
//! OMICSCOPE_CONFIG env var. Every field has a default, so an empty file is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "OMICSCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "omicscope.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
    #[serde(default = "default_gene_prefix")]
    pub gene_prefix: String,
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default = "default_heatmap_max_columns")]
    pub heatmap_max_columns: usize,
}

fn default_dataset_path()        -> String { "brca_data_w_subtypes.csv".to_string() }
fn default_gene_prefix()         -> String { "rs_".to_string() }
fn default_sample_rows()         -> usize  { 5 }
fn default_heatmap_max_columns() -> usize  { 40 }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            gene_prefix: default_gene_prefix(),
            sample_rows: default_sample_rows(),
            heatmap_max_columns: default_heatmap_max_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `ollama` or `openai` (any OpenAI-compatible server).
    #[serde(default = "default_llm_backend")]
    pub backend: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    pub api_key: Option<String>,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
}

fn default_llm_backend()  -> String { "ollama".to_string() }
fn default_llm_base_url() -> String { "http://localhost:11434".to_string() }
fn default_llm_model()    -> String { "wizardlm2:7b".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
}

fn default_translate_endpoint() -> String { omicscope_lang::translate::GOOGLE_TRANSLATE_URL.to_string() }

impl Default for TranslationConfig {
    fn default() -> Self {
        Self { endpoint: default_translate_endpoint() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_speech_language")]
    pub language: String,
    pub api_key: Option<String>,
    #[serde(default = "default_clip_path")]
    pub clip_path: String,
}

fn default_speech_endpoint() -> String { omicscope_lang::speech::GOOGLE_SPEECH_URL.to_string() }
fn default_speech_language() -> String { "en-US".to_string() }
fn default_clip_path()       -> String { "audio_query.wav".to_string() }

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            language: default_speech_language(),
            api_key: None,
            clip_path: default_clip_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "0.0.0.0:8501".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}


impl Config {
    /// Load configuration from omicscope.toml.
    /// Checks OMICSCOPE_CONFIG first, then the current directory. A missing
    /// default file yields built-in defaults; a missing explicit file is an
    /// error.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var(CONFIG_ENV).ok();
        let mut config = Self::load_from(explicit.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(explicit: Option<&str>) -> anyhow::Result<Self> {
        let path = explicit.unwrap_or(DEFAULT_CONFIG_FILE);

        if !Path::new(path).exists() {
            if explicit.is_some() {
                anyhow::bail!("Config file not found: {} (set by {})", path, CONFIG_ENV);
            }
            tracing::warn!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path, e))?;
        Ok(config)
    }

    /// API keys not set in the file fall back to OMICSCOPE_LLM_API_KEY and
    /// OMICSCOPE_SPEECH_API_KEY; OMICSCOPE_BIND overrides the bind address.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if self.llm.api_key.is_none() {
            self.llm.api_key = non_empty("OMICSCOPE_LLM_API_KEY");
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = non_empty("OMICSCOPE_SPEECH_API_KEY");
        }
        if let Some(bind) = non_empty("OMICSCOPE_BIND") {
            self.server.bind = bind;
        }
    }
}
