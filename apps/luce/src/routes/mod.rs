pub mod health;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{any, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::chat::handlers::handle_chat;
use crate::knowledge::handlers;
use crate::proxy::handle_proxy;
use crate::state::AppState;

/// All routes. The proxy is added after the CORS layer: it answers its own
/// preflights with the fixed origin.
pub fn build_router(state: AppState) -> Result<Router> {
    let origin = HeaderValue::from_str(&state.config.allowed_origin)
        .context("ALLOWED_ORIGIN must be a valid header value")?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(health::health_handler))
        // Chat
        .route("/api/chat", post(handle_chat))
        // Knowledge
        .route("/api/about", get(handlers::handle_about))
        .route("/api/projects", get(handlers::handle_list_projects))
        .route("/api/projects/:id", get(handlers::handle_get_project))
        .route(
            "/api/projects/:id/documents",
            get(handlers::handle_project_documents),
        )
        .route(
            "/api/projects/:id/metadata",
            get(handlers::handle_project_metadata),
        )
        .route("/documents/:filename", get(handlers::handle_document))
        .route("/cv/:filename", get(handlers::handle_cv))
        .layer(cors)
        // Chat Proxy
        .route("/api/groq", any(handle_proxy))
        .with_state(state))
}
