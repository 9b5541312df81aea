// crates/datacore-transport/src/direct.rs
// ============================================================================
// Module: Direct Transport
// Description: HTTP transport that calls the Datacore server from this process.
// Purpose: Execute catalog requests against the configured base address.
// Dependencies: datacore-config, datacore-core, reqwest
// ============================================================================

//! ## Overview
//! [`DirectTransport`] resolves each catalog request against the base address
//! held in the [`SharedConfigStore`] and sends it with `reqwest`. The base
//! address is read per request so settings changes and config pushes apply
//! without rebuilding the transport.
//!
//! Two timeouts apply: the per-read request timeout bounds idle time between
//! bytes, and the resource timeout bounds the whole exchange. Redirects are
//! not followed and response bodies are capped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use datacore_config::SharedConfigStore;
use datacore_config::TransportConfig;
use datacore_core::HttpMethod;
use datacore_core::HttpRequest;
use datacore_core::Transport;
use datacore_core::TransportFailure;
use datacore_core::TransportKind;
use datacore_core::TransportOutcome;
use datacore_core::TransportRequest;
use reqwest::Client;
use reqwest::Method;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default cap on response body size.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a direct transport.
#[derive(Debug, Error)]
pub enum DirectTransportError {
    /// The HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Direct Transport
// ============================================================================

/// HTTP transport reading its base address from the shared config store.
#[derive(Clone)]
pub struct DirectTransport {
    /// Shared config store holding the base address.
    shared: SharedConfigStore,
    /// HTTP client configured with timeouts.
    client: Client,
    /// Response body cap in bytes.
    max_response_bytes: usize,
}

impl DirectTransport {
    /// Builds a direct transport using the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DirectTransportError`] when the HTTP client cannot be built.
    pub fn new(
        shared: SharedConfigStore,
        config: &TransportConfig,
    ) -> Result<Self, DirectTransportError> {
        Self::with_timeouts(
            shared,
            config.request_timeout(),
            config.resource_timeout(),
            &config.user_agent,
        )
    }

    /// Builds a direct transport with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DirectTransportError`] when the HTTP client cannot be built.
    pub fn with_timeouts(
        shared: SharedConfigStore,
        request_timeout: Duration,
        resource_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, DirectTransportError> {
        let client = Client::builder()
            .read_timeout(request_timeout)
            .timeout(resource_timeout)
            .user_agent(user_agent.to_string())
            .redirect(Policy::none())
            .build()
            .map_err(|err| DirectTransportError::Client(err.to_string()))?;
        Ok(Self {
            shared,
            client,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Overrides the response body cap.
    #[must_use]
    pub const fn with_max_response_bytes(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }

    /// Sends a resolved request and reads the capped body.
    async fn send(&self, request: HttpRequest) -> TransportOutcome {
        let mut builder = self.client.request(reqwest_method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let mut response = builder.send().await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::HttpError {
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("unexpected status").to_string(),
            });
        }
        if let Some(expected) = response.content_length()
            && usize::try_from(expected).ok().is_none_or(|len| len > self.max_response_bytes)
        {
            return Err(oversized(self.max_response_bytes));
        }
        let mut body = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|err| map_body_error(&err, status.as_u16()))?
        {
            if body.len().saturating_add(chunk.len()) > self.max_response_bytes {
                return Err(oversized(self.max_response_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Direct
    }

    async fn execute(&self, request: &TransportRequest) -> TransportOutcome {
        let Some(base_address) = self.shared.base_address() else {
            return Err(TransportFailure::NoServer);
        };
        let resolved = HttpRequest::resolve(request, &base_address)?;
        self.send(resolved).await
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps catalog methods onto reqwest methods.
const fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}

/// Maps a send failure onto a transport failure.
fn map_send_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::Timeout;
    }
    TransportFailure::HttpError {
        status: None,
        message: err.to_string(),
    }
}

/// Maps a body read failure onto a transport failure.
fn map_body_error(err: &reqwest::Error, status: u16) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::Timeout;
    }
    TransportFailure::HttpError {
        status: Some(status),
        message: format!("response body read failed: {err}"),
    }
}

/// Builds the oversized-body failure.
fn oversized(max_bytes: usize) -> TransportFailure {
    TransportFailure::Decode(format!("response exceeds size limit of {max_bytes} bytes"))
}
