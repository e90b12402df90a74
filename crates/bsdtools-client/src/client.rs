//! The BSD Tools API client.
//!
//! [`Client`] validates credentials and the base URL up front, signs every
//! request through a [`SigningTransport`], and resolves deferred results with a
//! [`DeferredResolver`] before handing the response back.

use std::sync::Arc;
use std::time::Duration;

use bsdtools_auth::{AuthContext, Credentials, QueryParams, Signer};
use http::Method;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::deferred::{
    DEFERRED_ID_PARAM, DEFERRED_RESULTS_ENDPOINT, DeferredPolicy, DeferredResolver, DeferredToken,
};
use crate::error::{ClientError, ClientResult, ConfigError};
use crate::request::{ApiRequest, RequestBody};
use crate::response::ApiResponse;
use crate::reqwest_transport::ReqwestTransport;
use crate::transport::{SigningTransport, Transport};

/// Path appended to the base URL before every endpoint.
pub const API_PATH_PREFIX: &str = "/page/api/";

/// Signed client for the BSD Tools API.
///
/// # Examples
///
/// ```no_run
/// use bsdtools_auth::QueryParams;
/// use bsdtools_client::Client;
///
/// # async fn run() -> Result<(), bsdtools_client::ClientError> {
/// let client = Client::new("someone", "some_secret", "https://client.cp.bsd.net")?;
/// let query: QueryParams = [("cons_ids", "1")].into_iter().collect();
/// let response = client.get("cons/get_constituents_by_id", query).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client<T = ReqwestTransport> {
    credentials: Arc<Credentials>,
    api_root: String,
    transport: SigningTransport<T>,
    resolver: DeferredResolver,
}

impl Client<ReqwestTransport> {
    /// Create a client that talks to `base_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] if `id` or `secret` is empty,
    /// [`ConfigError::InvalidBaseUrl`] if `base_url` is not an absolute URL with a
    /// host, or a transport error if the HTTP client cannot be built.
    pub fn new(id: &str, secret: &str, base_url: &str) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(crate::reqwest_transport::DEFAULT_TIMEOUT)?;
        Self::with_transport(id, secret, base_url, transport)
    }

    /// Create a client from a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Client::new`].
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        let mut client =
            Self::with_transport(&config.api_id, &config.api_secret, &config.base_url, transport)?;
        client.set_deferred_policy(config.deferred_policy());
        Ok(client)
    }
}

impl<T: Transport> Client<T> {
    /// Create a client on top of an arbitrary transport.
    ///
    /// Requests are still signed; only delivery is replaced.
    ///
    /// # Errors
    ///
    /// Same validation as [`Client::new`].
    pub fn with_transport(
        id: &str,
        secret: &str,
        base_url: &str,
        transport: T,
    ) -> ClientResult<Self> {
        Self::with_signer(id, secret, base_url, transport, Signer::new())
    }

    /// Create a client with an explicit signer, e.g. one with a pinned clock.
    ///
    /// # Errors
    ///
    /// Same validation as [`Client::new`].
    pub fn with_signer(
        id: &str,
        secret: &str,
        base_url: &str,
        transport: T,
        signer: Signer,
    ) -> ClientResult<Self> {
        let credentials =
            Credentials::new(id, secret).map_err(|_| ConfigError::MissingCredentials)?;
        let base_url = validate_base_url(base_url)?;

        Ok(Self {
            credentials: Arc::new(credentials),
            api_root: format!("{base_url}{API_PATH_PREFIX}"),
            transport: SigningTransport::with_signer(transport, signer),
            resolver: DeferredResolver::default(),
        })
    }

    /// Execute a GET request against `api_path`.
    ///
    /// Query parameters belong in `query`, not in `api_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QueryInPath`] if `api_path` contains `?`, and a
    /// [`ClientError`] if signing or delivery fails, or if a deferred result
    /// cannot be resolved.
    pub async fn get(&self, api_path: &str, query: QueryParams) -> ClientResult<ApiResponse> {
        self.execute(Method::GET, api_path, query, RequestBody::Empty).await
    }

    /// Execute a POST request against `api_path`.
    ///
    /// # Errors
    ///
    /// Same as [`Client::get`].
    pub async fn post(
        &self,
        api_path: &str,
        query: QueryParams,
        body: RequestBody,
    ) -> ClientResult<ApiResponse> {
        self.execute(Method::POST, api_path, query, body).await
    }

    /// Execute a request and resolve any deferred result.
    ///
    /// # Errors
    ///
    /// Same as [`Client::get`].
    pub async fn execute(
        &self,
        method: Method,
        api_path: &str,
        query: QueryParams,
        body: RequestBody,
    ) -> ClientResult<ApiResponse> {
        let request = self
            .request(method, api_path)?
            .with_query(query)
            .with_body(body);
        let response = self.dispatch(request).await?;

        self.resolver
            .resolve(response, |token| self.fetch_deferred(token))
            .await
    }

    /// Build an unsigned request for `api_path` carrying this client's auth context.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::QueryInPath`] if `api_path` contains `?`, since the
    /// signed query would replace it on the wire, and [`ClientError::InvalidUrl`]
    /// if the endpoint URL does not parse.
    pub fn request(&self, method: Method, api_path: &str) -> ClientResult<ApiRequest> {
        if api_path.contains('?') {
            return Err(ClientError::QueryInPath {
                api_path: api_path.to_owned(),
            });
        }
        let endpoint = format!("{}{api_path}", self.api_root);
        let url = Url::parse(&endpoint).map_err(|source| ClientError::InvalidUrl {
            url: endpoint.clone(),
            source,
        })?;
        Ok(ApiRequest::new(method, url).with_auth(AuthContext::new(Arc::clone(&self.credentials))))
    }

    /// Send a request through the signing transport without deferred handling.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] or [`ClientError::Transport`] on failure.
    pub async fn dispatch(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "Sending API request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status(), "API request completed");
        Ok(response)
    }

    async fn fetch_deferred(&self, token: DeferredToken) -> ClientResult<ApiResponse> {
        let mut query = QueryParams::new();
        query.set(DEFERRED_ID_PARAM, token.as_str());
        let request = self
            .request(Method::GET, DEFERRED_RESULTS_ENDPOINT)?
            .with_query(query);
        self.dispatch(request).await
    }

    /// The API identifier.
    #[must_use]
    pub fn api_id(&self) -> &str {
        self.credentials.id()
    }

    /// Base URL with the API path prefix, e.g. `https://host/page/api/`.
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// The transport requests are delivered through, below the signing layer.
    #[must_use]
    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    /// The active deferred-result policy.
    #[must_use]
    pub fn deferred_policy(&self) -> &DeferredPolicy {
        self.resolver.policy()
    }

    /// Replace the deferred-result policy.
    pub fn set_deferred_policy(&mut self, policy: DeferredPolicy) {
        *self.resolver.policy_mut() = policy;
    }

    /// Set the delay before each deferred-result poll.
    pub fn set_deferred_result_interval(&mut self, interval: Duration) {
        self.resolver.policy_mut().interval = interval;
    }

    /// Set the maximum number of deferred-result polls.
    pub fn set_deferred_result_max_attempts(&mut self, max_attempts: u32) {
        self.resolver.policy_mut().max_attempts = max_attempts;
    }

    /// Enable or disable deferred-result resolution.
    pub fn set_process_deferred_results(&mut self, enabled: bool) {
        self.resolver.policy_mut().enabled = enabled;
    }
}

/// Check that `base_url` is an absolute URL with a host.
///
/// Returns the URL exactly as given; it is concatenated with the API path
/// prefix, not re-serialized.
fn validate_base_url(base_url: &str) -> Result<&str, ConfigError> {
    match Url::parse(base_url) {
        Ok(url) if url.has_host() => Ok(base_url),
        _ => Err(ConfigError::InvalidBaseUrl(base_url.to_owned())),
    }
}
