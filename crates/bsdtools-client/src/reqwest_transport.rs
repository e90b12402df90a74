//! Production transport backed by `reqwest`.
//!
//! The query string is encoded by this crate, not by `reqwest`, so the bytes
//! on the wire are exactly the ones the signature was computed over.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::request::{ApiRequest, MultipartPart, RequestBody};
use crate::response::ApiResponse;
use crate::transport::{Transport, TransportError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A [`Transport`] that sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bsdtools-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Use an existing `reqwest::Client`.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = request.wire_url();
        let mut builder = self.client.request(request.method.clone(), url);

        if let RequestBody::Multipart(parts) = &request.body {
            builder = builder.multipart(multipart_form(parts)?);
        } else if let Some((content, content_type)) = request.body.encode() {
            if let Some(content_type) = content_type {
                builder = builder.header(http::header::CONTENT_TYPE, content_type);
            }
            builder = builder.body(content);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(status, bytes = body.len(), "Received response");

        Ok(ApiResponse::new(status, body).with_headers(headers))
    }
}

/// Build a `reqwest` multipart form, preserving part order.
fn multipart_form(parts: &[MultipartPart]) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let mut field = reqwest::multipart::Part::bytes(part.content.to_vec());
        if let Some(filename) = &part.filename {
            field = field.file_name(filename.clone());
        }
        if let Some(content_type) = &part.content_type {
            field = field.mime_str(content_type)?;
        }
        form = form.part(part.name.clone(), field);
    }
    Ok(form)
}
