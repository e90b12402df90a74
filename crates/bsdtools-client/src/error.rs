//! Error types for the BSD Tools client.
//!
//! [`ConfigError`] covers everything that can go wrong before a request is
//! sent. [`ClientError`] is returned by every client call; transport failures
//! are carried through unchanged.

use bsdtools_auth::AuthError;

use crate::transport::TransportError;

/// Invalid client configuration, detected before any network access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API identifier or secret was empty.
    #[error("api_id and api_secret must both be provided")]
    MissingCredentials,

    /// The base URL could not be parsed or has no host.
    #[error("{0} is not a valid URL")]
    InvalidBaseUrl(String),

    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Errors returned by [`Client`](crate::Client) calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The signing hook rejected the request's auth context.
    #[error("signing failed: {0}")]
    Auth(#[from] AuthError),

    /// The endpoint URL built from the base URL and API path is malformed.
    #[error("invalid endpoint URL {url}: {source}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// The API path carried its own query string; parameters go in the query argument.
    #[error("API path {api_path} must not contain a query string")]
    QueryInPath {
        /// The rejected API path.
        api_path: String,
    },

    /// The deferred result was still pending after the configured number of polls.
    #[error("Could not load deferred response after {attempts} attempts")]
    DeferredExhausted {
        /// Number of poll requests made.
        attempts: u32,
        /// The deferred id that was polled.
        deferred_id: String,
    },

    /// A deferred poll ended with a status other than 200 or 204.
    #[error("Could not retrieve deferred result. HTTP Code {status} was returned")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The transport failed to deliver the request.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Auth(e) => Self::Auth(e),
            other => Self::Transport(other),
        }
    }
}

/// Convenience result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
