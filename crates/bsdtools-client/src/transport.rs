//! The transport seam and the signing middleware.
//!
//! [`Transport`] is the only thing the client needs from an HTTP stack: send
//! one [`ApiRequest`], return one [`ApiResponse`]. Transports compose like
//! middleware; [`SigningTransport`] is the request-mutation hook that attaches
//! `api_id`, `api_ts`, `api_ver` and `api_mac` before delegating to the inner
//! transport.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so it can be used as `Arc<dyn Transport>`.

use std::sync::Arc;

use bsdtools_auth::{AuthError, Signer};
use tracing::debug;

use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Errors raised while delivering a request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The signing hook rejected the request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The underlying HTTP client failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Sends a single request and returns its response.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `request` and return the server's response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request could not be delivered.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Middleware that signs every request before passing it on.
///
/// The credentials come from the request's [`AuthContext`](bsdtools_auth::AuthContext);
/// a request without one is rejected before it reaches the inner transport.
#[derive(Debug, Clone)]
pub struct SigningTransport<T> {
    inner: T,
    signer: Signer,
}

impl<T> SigningTransport<T> {
    /// Wrap `inner`, signing with the system clock.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self::with_signer(inner, Signer::new())
    }

    /// Wrap `inner` with a specific signer.
    #[must_use]
    pub fn with_signer(inner: T, signer: Signer) -> Self {
        Self { inner, signer }
    }

    /// The wrapped transport.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<T: Transport> Transport for SigningTransport<T> {
    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ctx = request.auth.as_ref().ok_or(AuthError::MissingAuthContext)?;
        let credentials = ctx.credentials()?;

        self.signer
            .sign(credentials, request.url.path(), &mut request.query);

        debug!(method = %request.method, path = %request.url.path(), "Dispatching signed request");

        self.inner.send(request).await
    }
}
