//! The authenticated request pipeline.
//!
//! One logical request = at most two network attempts (original + one retry)
//! and at most one refresh call. A 401 triggers the refresh-and-retry
//! protocol; any other non-2xx fails with a status-tagged error and no
//! retry. Concurrent 401s are coalesced behind a single in-flight refresh.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
pub use reqwest::Method;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use bdx_types::TokenPair;

use crate::error::ApiError;
use crate::session::SessionStore;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of an outbound request. JSON bodies imply the
/// `Content-Type: application/json` header; form bodies are URL-encoded.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Decoded response. JSON when the server declared it, raw text otherwise.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Deserializes the payload into a caller type.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value).map_err(ApiError::decode),
            Payload::Text(text) => serde_json::from_str(&text).map_err(ApiError::decode),
        }
    }
}

/// HTTP client for the auction backend.
///
/// Reads the session through the [`SessionStore`] it was constructed with;
/// it never mutates the session except through the store's setters (refresh
/// success, expiry clearing).
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
    /// Serializes refreshes so concurrent 401s perform one refresh total.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<SessionStore>) -> Result<Self> {
        Self::with_timeout(base_url, store, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        store: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Performs one logical request with auth and resilience semantics.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: &RequestBody,
    ) -> Result<Payload, ApiError> {
        let token = self.store.tokens().map(|pair| pair.access_token);
        let response = self.attempt(&method, path, body, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return self.refresh_and_retry(&method, path, body, token).await;
        }
        Self::decode_response(response).await
    }

    /// Convenience: GET returning a typed JSON payload.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &RequestBody::Empty)
            .await?
            .into_typed()
    }

    /// Convenience: POST with a JSON body, returning a typed JSON payload.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, &RequestBody::Json(body))
            .await?
            .into_typed()
    }

    async fn attempt(
        &self,
        method: &Method,
        path: &str,
        body: &RequestBody,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method.clone(), &url);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))
    }

    /// The 401 path: refresh once, retry the original request once.
    ///
    /// `stale_token` is the bearer the failed attempt carried; if the store
    /// holds a different token by the time we enter the gate, another
    /// request already refreshed and we retry without a network refresh.
    async fn refresh_and_retry(
        &self,
        method: &Method,
        path: &str,
        body: &RequestBody,
        stale_token: Option<String>,
    ) -> Result<Payload, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(pair) = self.store.tokens() {
            if stale_token.as_deref() != Some(pair.access_token.as_str()) {
                tracing::debug!("token already refreshed by a concurrent request; retrying");
                let response = self
                    .attempt(method, path, body, Some(&pair.access_token))
                    .await?;
                return Self::decode_response(response).await;
            }
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            return Err(self.expire("no refresh token"));
        };

        tracing::debug!(path, "access token rejected; refreshing");
        let result = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        let pair: TokenPair = match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<TokenPair>().await {
                    Ok(pair) if pair.is_valid() => pair,
                    Ok(_) => return Err(self.expire("refresh returned a partial pair")),
                    Err(e) => return Err(self.expire(&format!("refresh decode failed: {e}"))),
                }
            }
            Ok(response) => {
                return Err(self.expire(&format!("refresh failed with HTTP {}", response.status())))
            }
            Err(e) => return Err(self.expire(&format!("refresh transport error: {e}"))),
        };

        if let Err(e) = self.store.set_tokens(Some(&pair)) {
            tracing::error!("failed to persist refreshed tokens: {e:#}");
        }

        // Exactly one retry; a second 401 propagates as an HTTP error.
        let response = self
            .attempt(method, path, body, Some(&pair.access_token))
            .await?;
        Self::decode_response(response).await
    }

    /// Failure path: clear all persisted session state and signal expiry.
    fn expire(&self, reason: &str) -> ApiError {
        tracing::warn!(reason, "session expired; clearing persisted state");
        if let Err(e) = self.store.clear() {
            tracing::error!("failed to clear session: {e:#}");
        }
        ApiError::SessionExpired
    }

    async fn decode_response(response: reqwest::Response) -> Result<Payload, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if is_json {
            response
                .json::<Value>()
                .await
                .map(Payload::Json)
                .map_err(ApiError::decode)
        } else {
            response
                .text()
                .await
                .map(Payload::Text)
                .map_err(|e| ApiError::from_reqwest(&e))
        }
    }
}
