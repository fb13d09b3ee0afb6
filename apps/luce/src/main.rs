mod chat;
mod composer;
mod config;
mod conversation;
mod errors;
mod github;
mod intent;
mod knowledge;
mod llm_client;
mod proxy;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::Dialogue;
use crate::composer::{AnswerComposer, ComposerSettings};
use crate::config::Config;
use crate::github::GithubClient;
use crate::intent::IntentRouter;
use crate::knowledge::KnowledgeStore;
use crate::llm_client::LlmClient;
use crate::proxy::ChatProxy;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Luce v{}", env!("CARGO_PKG_VERSION"));

    // Knowledge store: loaded once, shared read-only
    let knowledge = Arc::new(
        KnowledgeStore::load(&config.data_dir)
            .with_context(|| format!("Failed to load knowledge from {}", config.data_dir.display()))?,
    );

    let timeout = Duration::from_secs(config.llm_timeout_secs);
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY is not set: the chat proxy will answer 500");
    }

    // Composer goes through the proxy when one is configured, else straight to the provider
    let llm = match &config.chat_proxy_url {
        Some(proxy_url) => LlmClient::new(proxy_url.clone(), None, timeout)?,
        None => LlmClient::new(config.llm_api_url.clone(), config.groq_api_key.clone(), timeout)?,
    };
    info!(
        "LLM client initialized (endpoint: {}, model: {})",
        llm.endpoint(),
        config.llm_model
    );

    let composer = AnswerComposer::new(
        Arc::new(llm),
        knowledge.clone(),
        ComposerSettings {
            model: config.llm_model.clone(),
            timeout,
            ..ComposerSettings::default()
        },
    );
    let router =
        IntentRouter::new(knowledge.clone()).with_min_token_len(config.min_project_token_len);
    let dialogue = Dialogue::new(router, composer);

    let proxy = ChatProxy::new(
        config.llm_api_url.clone(),
        config.groq_api_key.clone(),
        &config.allowed_origin,
        timeout,
    )
    .context("Invalid chat proxy configuration")?;

    let github = GithubClient::new(
        config.github_api_base.clone(),
        config.github_token.clone(),
        timeout,
    )?;

    let state = AppState {
        knowledge,
        dialogue,
        proxy,
        github,
        config: config.clone(),
    };

    let app = build_router(state)?.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
