//! Deterministic transport for tests.
//!
//! [`ScriptedTransport`] replays a queue of canned responses in order and
//! records every request it receives, so tests can drive the client through
//! deferred-result sequences without a network.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::transport::{Transport, TransportError};

/// A transport that answers from a script.
///
/// # Examples
///
/// ```
/// use bsdtools_client::ApiResponse;
/// use bsdtools_client::testing::ScriptedTransport;
///
/// let transport = ScriptedTransport::new([ApiResponse::new(200, "ABC")]);
/// assert_eq!(transport.remaining(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Create a transport that will return `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response.
    pub fn push(&self, response: ApiResponse) {
        self.responses.lock().push_back(response);
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of responses not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| {
                TransportError::Other("scripted transport has no responses left".to_owned())
            })
    }
}
