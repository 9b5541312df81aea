// crates/datacore-core/src/core/request.rs
// ============================================================================
// Module: Request Construction
// Description: Logical transport requests and resolved HTTP requests.
// Purpose: Turn catalog endpoints into concrete HTTP calls generically.
// Dependencies: serde, serde_json, url
// ============================================================================

//! ## Overview
//! A [`TransportRequest`] is what the coordinator hands to any transport: a
//! catalog endpoint plus an optional JSON body. The direct transport resolves
//! it into an [`HttpRequest`] against the configured base address; the relay
//! transport forwards the endpoint's op id and parameters instead and never
//! builds a URL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::core::endpoint::Endpoint;
use crate::core::endpoint::EndpointCatalog;
use crate::core::endpoint::EndpointOp;
use crate::core::endpoint::HttpMethod;
use crate::interfaces::TransportFailure;

// ============================================================================
// SECTION: Logical Request
// ============================================================================

/// Transport-independent request for one catalog operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Endpoint built from the catalog.
    pub endpoint: Endpoint,
    /// Optional JSON body (snake_case on the wire).
    pub body: Option<Value>,
}

impl TransportRequest {
    /// Builds a body-less request for an operation.
    #[must_use]
    pub fn new(op: EndpointOp) -> Self {
        Self {
            endpoint: EndpointCatalog::build(op),
            body: None,
        }
    }

    /// Builds a request carrying a serialized body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFailure::Decode`] when the body cannot be encoded.
    pub fn with_body<T: Serialize>(op: EndpointOp, body: &T) -> Result<Self, TransportFailure> {
        let body = serde_json::to_value(body)
            .map_err(|err| TransportFailure::Decode(format!("request body encoding: {err}")))?;
        Ok(Self {
            endpoint: EndpointCatalog::build(op),
            body: Some(body),
        })
    }
}

// ============================================================================
// SECTION: Resolved HTTP Request
// ============================================================================

/// A fully resolved HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute request URL.
    pub url: Url,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Encoded request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Resolves a logical request against a base address.
    ///
    /// The URL is `base_address + endpoint.path + '?' + query`; any path
    /// prefix on the base address is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFailure::InvalidUrl`] when the base address is not
    /// an absolute `http`/`https` URL, or [`TransportFailure::Decode`] when
    /// the body cannot be encoded.
    pub fn resolve(
        request: &TransportRequest,
        base_address: &str,
    ) -> Result<Self, TransportFailure> {
        let mut url = parse_base_address(base_address)?;
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{}", request.endpoint.path()));
        url.set_query(request.endpoint.query_string().as_deref());
        url.set_fragment(None);

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        let body = match &request.body {
            Some(value) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                let bytes = serde_json::to_vec(value).map_err(|err| {
                    TransportFailure::Decode(format!("request body encoding: {err}"))
                })?;
                Some(bytes)
            }
            None => None,
        };
        Ok(Self {
            url,
            method: request.endpoint.method,
            headers,
            body,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses and validates a base address.
fn parse_base_address(base_address: &str) -> Result<Url, TransportFailure> {
    let trimmed = base_address.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| TransportFailure::InvalidUrl(format!("{trimmed}: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(TransportFailure::InvalidUrl(format!("unsupported scheme: {scheme}")));
        }
    }
    if url.host_str().is_none() || url.cannot_be_a_base() {
        return Err(TransportFailure::InvalidUrl(format!("base address has no host: {trimmed}")));
    }
    Ok(url)
}
