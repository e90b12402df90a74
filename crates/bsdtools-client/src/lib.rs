//! Signed client for the BSD Tools API.
//!
//! Every request is signed with the BSD Tools v2 scheme (see
//! [`bsdtools_auth`]) and every `202 Accepted` answer is resolved by polling
//! `get_deferred_results` until the real result is available.
//!
//! # Architecture
//!
//! ```text
//! Client::get/post
//!   -> SigningTransport   (request-mutation hook: api_id, api_ts, api_ver, api_mac)
//!   -> Transport          (ReqwestTransport in production, ScriptedTransport in tests)
//!   -> DeferredResolver   (response interception: poll while 202/503)
//!   -> caller
//! ```
//!
//! # Modules
//!
//! - [`client`] - The [`Client`] entry point
//! - [`config`] - [`ClientConfig`] with builder and environment loading
//! - [`deferred`] - Deferred-result state machine
//! - [`error`] - Error types
//! - [`request`] / [`response`] - Request and response envelopes
//! - [`reqwest_transport`] - HTTP transport backed by `reqwest`
//! - [`testing`] - Scripted transport for tests
//! - [`transport`] - The [`Transport`] trait and signing middleware

pub mod client;
pub mod config;
pub mod deferred;
pub mod error;
pub mod reqwest_transport;
pub mod request;
pub mod response;
pub mod testing;
pub mod transport;

pub use client::{API_PATH_PREFIX, Client};
pub use config::ClientConfig;
pub use deferred::{DeferredPolicy, DeferredResolver, DeferredToken};
pub use error::{ClientError, ClientResult, ConfigError};
pub use reqwest_transport::ReqwestTransport;
pub use request::{ApiRequest, MultipartPart, RequestBody};
pub use response::ApiResponse;
pub use transport::{SigningTransport, Transport, TransportError};
