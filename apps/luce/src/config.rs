use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::github::GITHUB_API_BASE;
use crate::intent::MIN_PROJECT_TOKEN_LEN;
use crate::llm_client::{DEFAULT_MODEL, GROQ_CHAT_URL};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://giusepperubino.eu";

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Holds about.json, projects.json, documents/ and the CV.
    pub data_dir: PathBuf,
    /// Server-held provider credential. The proxy answers 500 without it.
    pub groq_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    /// When set, the composer posts here instead of calling the provider directly.
    pub chat_proxy_url: Option<String>,
    pub llm_timeout_secs: u64,
    /// Shortest project-name token the router matches on its own.
    pub min_project_token_len: usize,
    pub allowed_origin: String,
    pub github_api_base: String,
    pub github_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            groq_api_key: optional_env("GROQ_API_KEY"),
            llm_api_url: env_or("LLM_API_URL", GROQ_CHAT_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL),
            chat_proxy_url: optional_env("CHAT_PROXY_URL"),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            min_project_token_len: match optional_env("MIN_PROJECT_TOKEN_LEN") {
                Some(v) => v
                    .parse::<usize>()
                    .context("MIN_PROJECT_TOKEN_LEN must be a whole number")?,
                None => MIN_PROJECT_TOKEN_LEN,
            },
            allowed_origin: env_or("ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
            github_api_base: env_or("GITHUB_API_BASE", GITHUB_API_BASE),
            github_token: optional_env("GITHUB_TOKEN"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
