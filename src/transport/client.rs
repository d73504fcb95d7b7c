//! HTTP client for the runtime backend
//!
//! Every call goes to a fixed base endpoint with the timeout of its route's
//! class. Failures come back as `TransportError`: the response status for
//! non-2xx answers, `0` when no answer arrived.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::TimeoutPolicy;
use crate::core::{RuntimeError, RuntimeResult, TransportError};

use super::routes::Route;

/// Stateless client bound to one backend endpoint
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    base_url: String,
    timeouts: TimeoutPolicy,
}

impl RpcClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>, timeouts: TimeoutPolicy) -> Self {
        Self::with_client(Client::new(), base_url, timeouts)
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_client(client: Client, base_url: impl Into<String>, timeouts: TimeoutPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeouts,
        }
    }

    /// Get the base endpoint
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the timeout policy
    pub fn timeouts(&self) -> &TimeoutPolicy {
        &self.timeouts
    }

    /// Absolute URL of a route
    pub fn url(&self, route: Route) -> String {
        format!("{}{}", self.base_url, route.path())
    }

    /// Call a route without a body and decode the response
    pub async fn call<T: DeserializeOwned>(&self, route: Route) -> RuntimeResult<T> {
        let text = self.exchange(route, None::<&()>).await?;
        decode(route, &text)
    }

    /// Call a route with a JSON body and decode the response
    pub async fn call_with<B, T>(&self, route: Route, body: &B) -> RuntimeResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.exchange(route, Some(body)).await?;
        decode(route, &text)
    }

    /// Call a route without a body, only checking for success
    pub async fn send(&self, route: Route) -> RuntimeResult<()> {
        self.exchange(route, None::<&()>).await.map(|_| ())
    }

    /// Call a route with a JSON body, only checking for success
    pub async fn send_with<B: Serialize + ?Sized>(&self, route: Route, body: &B) -> RuntimeResult<()> {
        self.exchange(route, Some(body)).await.map(|_| ())
    }

    /// Perform one request and return the body of a 2xx response
    async fn exchange<B: Serialize + ?Sized>(
        &self,
        route: Route,
        body: Option<&B>,
    ) -> RuntimeResult<String> {
        let url = self.url(route);
        let timeout = self.timeouts.for_class(route.timeout_class());

        tracing::debug!("[RpcClient] {} {} (timeout {:?})", route.method(), url, timeout);

        let mut request = self.client.request(route.method(), &url).timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| unreachable_error(route, &url, &e))?;

        let status = response.status();
        tracing::debug!("[RpcClient] {} -> {}", route, status);

        if !status.is_success() {
            // The status line arrived, so this stays a rejection even if the body is cut short
            let (text, details) = match response.text().await {
                Ok(text) => {
                    let details = details_from_body(&text);
                    (text, details)
                }
                Err(e) => {
                    tracing::warn!("[RpcClient] {} error body unreadable: {}", route, e);
                    (format!("{} (body unreadable: {})", status, e), None)
                }
            };

            tracing::warn!("[RpcClient] {} failed with {}: {}", route, status, text);
            return Err(TransportError::rejected(
                format!("{}: {}", route.failure_label(), text),
                status.as_u16(),
                details,
            )
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| unreachable_error(route, &url, &e))
    }
}

/// Map a failure where no response was received to a status-0 error
fn unreachable_error(route: Route, url: &str, err: &reqwest::Error) -> RuntimeError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "request"
    };

    tracing::warn!("[RpcClient] {} unreachable ({}): {}", route, kind, err);

    TransportError::unreachable(
        format!("{}: {}", route.failure_label(), err),
        Some(json!({ "kind": kind, "url": url })),
    )
    .into()
}

/// Structured form of an error body: parsed JSON, or the raw text
fn details_from_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// An empty success body decodes like `{}`
fn decode<T: DeserializeOwned>(route: Route, text: &str) -> RuntimeResult<T> {
    let body = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(body).map_err(|source| RuntimeError::Decode {
        route: route.path(),
        source,
    })
}
