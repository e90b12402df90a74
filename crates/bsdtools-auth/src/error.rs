//! Error types for request signing.

/// Errors that can occur while constructing credentials or signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The API identifier or secret was empty.
    #[error("api_id and api_secret must both be provided")]
    MissingCredentials,

    /// A request reached the signing hook without an auth context attached.
    #[error("Authorization information not provided")]
    MissingAuthContext,

    /// The auth context names a scheme other than `bsdtools_v2`.
    #[error("Unsupported auth type: {0}")]
    UnsupportedAuthType(String),
}
