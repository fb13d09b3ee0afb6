//! Chat Proxy: relays chat-completion payloads to the provider with the
//! server-held credential, so the key never reaches the browser.
//!
//! No business logic and no retries. The upstream status and body are passed
//! through untouched; every response carries the fixed-origin CORS headers.

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::state::AppState;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

#[derive(Clone)]
pub struct ChatProxy {
    client: Client,
    upstream: String,
    api_key: Option<String>,
    allowed_origin: HeaderValue,
}

impl ChatProxy {
    pub fn new(
        upstream: impl Into<String>,
        api_key: Option<String>,
        allowed_origin: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            upstream: upstream.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            allowed_origin: HeaderValue::from_str(allowed_origin)?,
        })
    }

    /// Handles one request to the proxy route, whatever its method.
    pub async fn handle(&self, method: Method, body: Bytes) -> Response {
        let mut response = if method == Method::OPTIONS {
            StatusCode::NO_CONTENT.into_response()
        } else {
            match self.forward(method, body).await {
                Ok(response) => response,
                Err(e) => e.into_response(),
            }
        };
        self.apply_cors(response.headers_mut());
        response
    }

    async fn forward(&self, method: Method, body: Bytes) -> Result<Response, AppError> {
        if method != Method::POST {
            return Err(AppError::MethodNotAllowed);
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing GROQ_API_KEY".to_string()))?;
        if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
            return Err(AppError::Validation("Invalid JSON body".to_string()));
        }

        debug!("Forwarding {} bytes to chat provider", body.len());
        let upstream = self
            .client
            .post(&self.upstream)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        // reqwest and axum sit on different `http` versions: convert by value.
        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        info!("Chat provider answered {status}");

        Ok((
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response())
    }

    fn apply_cors(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allowed_origin.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
}

/// ANY /api/groq
pub async fn handle_proxy(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    state.proxy.handle(method, body).await
}
