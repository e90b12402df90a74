//! API credentials and the auth context attached to outgoing requests.
//!
//! [`Credentials`] is the immutable `(api_id, api_secret)` pair a client is
//! created with. [`AuthContext`] is what actually travels with each request to
//! the signing hook: the shared credentials plus the name of the auth scheme.

use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;

/// Name of the only auth scheme the signing hook accepts.
pub const AUTH_TYPE: &str = "bsdtools_v2";

/// An API identifier and its shared secret.
///
/// Both values are guaranteed to be non-empty.
///
/// # Examples
///
/// ```
/// use bsdtools_auth::Credentials;
///
/// let credentials = Credentials::new("someone", "some_secret").unwrap();
/// assert_eq!(credentials.id(), "someone");
/// assert!(Credentials::new("", "some_secret").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    id: String,
    secret: String,
}

impl Credentials {
    /// Create a credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if either value is empty.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Result<Self, AuthError> {
        let id = id.into();
        let secret = secret.into();
        if id.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(Self { id, secret })
    }

    /// The API identifier sent as `api_id`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The shared secret used as the HMAC key.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Authentication information carried by a single request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    credentials: Arc<Credentials>,
    auth_type: String,
}

impl AuthContext {
    /// Create a `bsdtools_v2` auth context for the given credentials.
    #[must_use]
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self {
            credentials,
            auth_type: AUTH_TYPE.to_owned(),
        }
    }

    /// Create an auth context with an explicit scheme name.
    #[must_use]
    pub fn with_auth_type(credentials: Arc<Credentials>, auth_type: impl Into<String>) -> Self {
        Self {
            credentials,
            auth_type: auth_type.into(),
        }
    }

    /// The scheme name.
    #[must_use]
    pub fn auth_type(&self) -> &str {
        &self.auth_type
    }

    /// Check that the context names the `bsdtools_v2` scheme and return its credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedAuthType`] for any other scheme.
    pub fn credentials(&self) -> Result<&Credentials, AuthError> {
        if self.auth_type != AUTH_TYPE {
            return Err(AuthError::UnsupportedAuthType(self.auth_type.clone()));
        }
        Ok(&self.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_reject_empty_id_or_secret() {
        assert!(matches!(
            Credentials::new("", "some_secret"),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::new("someone", ""),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let credentials = Credentials::new("someone", "some_secret").unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("someone"));
        assert!(!debug.contains("some_secret"));
    }

    #[test]
    fn test_should_accept_bsdtools_auth_type() {
        let credentials = Arc::new(Credentials::new("123", "a1b2c3").unwrap());
        let ctx = AuthContext::new(credentials);
        assert_eq!(ctx.auth_type(), AUTH_TYPE);
        assert_eq!(ctx.credentials().unwrap().id(), "123");
    }

    #[test]
    fn test_should_reject_wrong_auth_type() {
        let credentials = Arc::new(Credentials::new("123", "a1b2c3").unwrap());
        let ctx = AuthContext::with_auth_type(credentials, "not-the-correct-auth-type");
        assert!(matches!(
            ctx.credentials(),
            Err(AuthError::UnsupportedAuthType(t)) if t == "not-the-correct-auth-type"
        ));
    }
}
