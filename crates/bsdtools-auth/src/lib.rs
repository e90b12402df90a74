//! BSD Tools API v2 request signing.
//!
//! Every request to the BSD Tools API carries four reserved query parameters:
//!
//! - `api_id` - the client identifier
//! - `api_ts` - unix timestamp in seconds
//! - `api_ver` - protocol version, always `2`
//! - `api_mac` - hex-encoded HMAC-SHA1 over the other parameters and the path
//!
//! This crate implements the signing side: given [`Credentials`], a request
//! path and an ordered set of [`QueryParams`], [`Signer`] produces the signed
//! query that is sent on the wire.
//!
//! # Usage
//!
//! ```rust
//! use bsdtools_auth::{Credentials, FixedClock, QueryParams, Signer};
//!
//! let credentials = Credentials::new("123", "a1b2c3").unwrap();
//! let signer = Signer::with_clock(FixedClock::new(55_555));
//!
//! let mut query = QueryParams::new();
//! signer.sign(&credentials, "/my-api-path", &mut query);
//!
//! assert_eq!(
//!     query.get("api_mac"),
//!     Some("1d16e325742f7d4c77801513c0cf7ba3208c7d97")
//! );
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Path normalization and query string encoding
//! - [`credentials`] - Credential pair and per-request auth context
//! - [`error`] - Authentication error types
//! - [`query`] - Insertion-ordered query parameters
//! - [`signer`] - `api_mac` computation and query signing

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod query;
pub mod signer;

pub use credentials::{AUTH_TYPE, AuthContext, Credentials};
pub use error::AuthError;
pub use query::QueryParams;
pub use signer::{API_VERSION, Clock, FixedClock, Signer, SystemClock, compute_mac};
