//! OmicScope - multi-omics analysis dashboard and chat bot.
//! Entry point for the server binary.

mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use omicscope_chat::{ChatService, QueryRouter};
use omicscope_data::Dataset;
use omicscope_lang::{GoogleSpeechTranscriber, GoogleTranslator, VoiceInput};
use omicscope_llm::{LlmBackend, OllamaBackend, OpenAiCompatibleBackend};
use omicscope_web::{build_router, AppState, DashboardSettings};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn build_llm_backend(cfg: &config::LlmConfig) -> anyhow::Result<Arc<dyn LlmBackend>> {
    let timeout = cfg.timeout_secs.map(Duration::from_secs);

    let backend: Arc<dyn LlmBackend> = match cfg.backend.as_str() {
        "ollama" => {
            let mut b = OllamaBackend::new(&cfg.base_url, &cfg.model);
            if let Some(t) = timeout {
                b = b.with_timeout(t);
            }
            Arc::new(b)
        }
        "openai" | "openai_compatible" => {
            if cfg.api_key.is_none() {
                tracing::warn!("OpenAI-compatible backend configured without an API key (set llm.api_key or OMICSCOPE_LLM_API_KEY)");
            }
            let mut b = OpenAiCompatibleBackend::new(&cfg.base_url, &cfg.model, cfg.api_key.clone());
            if let Some(t) = timeout {
                b = b.with_timeout(t);
            }
            Arc::new(b)
        }
        other => anyhow::bail!("Unknown LLM backend '{}' (expected 'ollama' or 'openai')", other),
    };
    Ok(backend)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("omicscope=debug,info")),
        )
        .init();

    info!("🔬 OmicScope starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!(
        "Configuration loaded. LLM: {} ({}) at {}",
        config.llm.model, config.llm.backend, config.llm.base_url
    );

    // The dashboard is useless without its table
    let dataset = match Dataset::load(&config.dataset.path).await {
        Ok(ds) => Arc::new(ds),
        Err(e) => {
            tracing::error!("❌ {}", e);
            anyhow::bail!("Cannot start without the dataset at {}: {}", config.dataset.path, e);
        }
    };
    info!("✅ Dataset ready: {} rows × {} columns", dataset.row_count(), dataset.column_count());

    let llm = build_llm_backend(&config.llm)?;
    info!("✅ LLM backend ready: {} ({})", llm.model_id(), llm.backend_name());

    let router = QueryRouter::new(dataset.clone(), llm).with_gene_prefix(&config.dataset.gene_prefix);
    let translator = Arc::new(GoogleTranslator::with_endpoint(&config.translation.endpoint));
    let chat = ChatService::new(router, translator);

    let transcriber = Arc::new(GoogleSpeechTranscriber::with_endpoint(
        &config.speech.endpoint,
        &config.speech.language,
        config.speech.api_key.clone(),
    ));
    let voice = VoiceInput::new(transcriber, &config.speech.clip_path);

    let dataset_name = Path::new(&config.dataset.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.dataset.path.clone());
    let settings = DashboardSettings {
        sample_rows: config.dataset.sample_rows,
        gene_prefix: config.dataset.gene_prefix.clone(),
        heatmap_max_columns: config.dataset.heatmap_max_columns,
    };

    // Build app state and router
    let state = AppState::new(dataset, dataset_name, chat, voice, settings);
    let app = build_router(state);

    // Start web server
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("🌐 Dashboard listening on http://{}", config.server.bind);
    info!("🔬 OmicScope ready. Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;

    Ok(())
}
