//! Pluggable HTTP transport
//!
//! The pipeline speaks to the network only through [`Transport`], which
//! keeps the authentication and retry logic independent of the HTTP stack.
//! Timeouts are enforced by the caller by dropping the returned future.

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use super::request::{Method, MultipartPart, OutboundRequest, RequestBody};
use super::response::RawResponse;

/// Failure below the HTTP layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset, broken body stream
    #[error("network failure: {0}")]
    Network(String),
    /// The request could not be built or sent for a non-network reason
    #[error("transport failure: {0}")]
    Other(String),
}

/// Executes one HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;

    /// Transport name for logging/debugging
    fn transport_name(&self) -> &'static str;
}

/// Production transport backed by `reqwest`
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn multipart_form(parts: &[MultipartPart]) -> Result<reqwest::multipart::Form, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartPart::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut file_part =
                        reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(content_type) = content_type {
                        file_part = file_part.mime_str(content_type).map_err(|e| {
                            TransportError::Other(format!(
                                "Invalid content type '{}' for part {}: {}",
                                content_type, name, e
                            ))
                        })?;
                    }
                    form.part(name.clone(), file_part)
                }
            };
        }
        Ok(form)
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_builder() {
            TransportError::Other(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| TransportError::Other(format!("Failed to encode body: {}", e)))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(form) => builder.multipart(Self::multipart_form(form.parts())?),
        };

        let response = builder.send().await.map_err(Self::classify)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(Self::classify)?;

        debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            body.len()
        );

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            content_type,
            body: body.to_vec(),
        })
    }

    fn transport_name(&self) -> &'static str {
        "reqwest"
    }
}
