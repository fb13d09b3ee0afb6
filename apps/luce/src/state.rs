use std::sync::Arc;

use crate::chat::Dialogue;
use crate::config::Config;
use crate::github::GithubClient;
use crate::knowledge::KnowledgeStore;
use crate::proxy::ChatProxy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; read-only afterwards.
    pub knowledge: Arc<KnowledgeStore>,
    pub dialogue: Dialogue,
    pub proxy: ChatProxy,
    pub github: GithubClient,
    pub config: Config,
}
