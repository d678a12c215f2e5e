//! RAG config check
//!
//! Loads the service settings, builds the configured LLM and embedding
//! clients and prints the effective configuration. With `--probe` it also
//! sends one request through each client.

use anyhow::{Context, Result};
use clap::Parser;
use rag_config::{
    config::{Settings, ENV_FILE},
    logging::init_tracing,
    providers::{get_embeddings, get_llm},
    schemas::ChatMessage,
};
use std::path::PathBuf;

/// Validate RAG service configuration
#[derive(Parser, Debug)]
#[command(name = "rag-config")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Env override file (lower precedence than real environment variables)
    #[arg(long, default_value = ENV_FILE)]
    env_file: PathBuf,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Send this text to the LLM and embed it with the embedding model
    #[arg(long)]
    probe: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::from_env_file(&args.env_file)
        .with_context(|| format!("Failed to load settings (env file: {})", args.env_file.display()))?;
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    init_tracing(&settings)?;

    let llm = get_llm(&settings)?;
    let embeddings = get_embeddings(&settings)?;

    tracing::info!(
        llm_provider = %llm.provider(),
        llm_model = %llm.model(),
        embedding_provider = %embeddings.provider(),
        embedding_model = %embeddings.model(),
        api_addr = %settings.server_addr(),
        "Configuration loaded"
    );

    println!("{}", serde_json::to_string_pretty(&settings)?);

    if let Some(text) = args.probe {
        let reply = llm
            .invoke(&[ChatMessage::user(text.clone())])
            .await
            .context("LLM probe failed")?;
        println!("\nLLM reply ({}): {}", llm.provider(), reply);

        let vector = embeddings
            .embed_query(&text)
            .await
            .context("Embedding probe failed")?;
        println!("Embedding ({}): {} dimensions", embeddings.provider(), vector.len());
    }

    Ok(())
}
