//! Deferred-result resolution.
//!
//! Long-running API calls answer `202 Accepted` with a deferred id in the body
//! instead of the result. The result is fetched later from the
//! `get_deferred_results` endpoint:
//!
//! | Status | Meaning | Action |
//! |--------|---------|--------|
//! | 200 | result ready | return |
//! | 204 | result ready, empty | return |
//! | 202 | deferred / still compiling | poll |
//! | 503 | still compiling (while polling) | poll |
//! | other | unexpected | return, or fail under [`DeferredPolicy::fail_on_unexpected_status`] |
//!
//! The resolver moves through
//! `Initial -> Deferred -> Polling -> Resolved | Exhausted`. It holds no state
//! between calls.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::response::ApiResponse;

/// Endpoint polled for deferred results, relative to the API root.
pub const DEFERRED_RESULTS_ENDPOINT: &str = "get_deferred_results";

/// Query parameter carrying the deferred id.
pub const DEFERRED_ID_PARAM: &str = "deferred_id";

/// Field in a 202 body that marks a triggered-email send rather than a deferred result.
pub const TRIGGERED_MAIL_FIELD: &str = "mailing_triggered_id";

/// Default delay before each poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of polls before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

const STATUS_OK: u16 = 200;
const STATUS_DEFERRED: u16 = 202;
const STATUS_NO_CONTENT: u16 = 204;
const STATUS_COMPILING: u16 = 503;

/// Opaque id of a pending server-side computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeferredToken(String);

impl DeferredToken {
    /// Wrap a raw deferred id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as sent in `deferred_id`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeferredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the resolver reacts to deferred responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredPolicy {
    /// Whether 202 responses are resolved at all.
    pub enabled: bool,
    /// Delay before each poll.
    pub interval: Duration,
    /// Maximum number of polls.
    pub max_attempts: u32,
    /// Fail with [`ClientError::UnexpectedStatus`] when polling ends on a status
    /// other than 200 or 204, instead of returning that response.
    pub fail_on_unexpected_status: bool,
}

impl Default for DeferredPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            fail_on_unexpected_status: false,
        }
    }
}

/// Classification of the first response of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initial {
    /// Not a 202: the response is the result.
    Ready,
    /// A 202 from a triggered-email send; returned unchanged.
    TriggeredSend,
    /// A genuine deferred result.
    Deferred(DeferredToken),
}

/// Inspect the first response of a call.
///
/// # Examples
///
/// ```
/// use bsdtools_client::ApiResponse;
/// use bsdtools_client::deferred::{DeferredToken, Initial, inspect};
///
/// assert_eq!(inspect(&ApiResponse::new(200, "ABC")), Initial::Ready);
/// assert_eq!(
///     inspect(&ApiResponse::new(202, "42")),
///     Initial::Deferred(DeferredToken::new("42"))
/// );
/// assert_eq!(
///     inspect(&ApiResponse::new(202, r#"{"mailing_triggered_id":"7"}"#)),
///     Initial::TriggeredSend
/// );
/// ```
#[must_use]
pub fn inspect(response: &ApiResponse) -> Initial {
    if response.status() != STATUS_DEFERRED {
        return Initial::Ready;
    }
    if is_triggered_send(response.body()) {
        return Initial::TriggeredSend;
    }
    Initial::Deferred(deferred_token(response.body()))
}

/// Take the 202 body as the deferred id.
///
/// The id is echoed back to the server, so a body that is not valid UTF-8 is
/// decoded lossily and reported.
fn deferred_token(body: &[u8]) -> DeferredToken {
    match std::str::from_utf8(body) {
        Ok(id) => DeferredToken::new(id),
        Err(err) => {
            warn!(
                error = %err,
                "Deferred id is not valid UTF-8, polling with a lossy copy"
            );
            DeferredToken::new(String::from_utf8_lossy(body))
        }
    }
}

/// Whether a 202 body is a JSON object with a non-null `mailing_triggered_id`.
fn is_triggered_send(body: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get(TRIGGERED_MAIL_FIELD).map(|v| !v.is_null()))
        .unwrap_or(false)
}

/// Turns deferred responses into resolved ones by polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredResolver {
    policy: DeferredPolicy,
}

impl DeferredResolver {
    /// Create a resolver with the given policy.
    #[must_use]
    pub fn new(policy: DeferredPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &DeferredPolicy {
        &self.policy
    }

    /// Mutable access to the policy.
    pub fn policy_mut(&mut self) -> &mut DeferredPolicy {
        &mut self.policy
    }

    /// Resolve `response`, calling `fetch` once per poll.
    ///
    /// `fetch` must issue a signed `GET get_deferred_results?deferred_id=<token>`.
    /// Each poll is preceded by a sleep of [`DeferredPolicy::interval`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DeferredExhausted`] if every poll answered 202 or
    /// 503, [`ClientError::UnexpectedStatus`] if the policy asks for it, and any
    /// error `fetch` returns.
    pub async fn resolve<F, Fut>(
        &self,
        response: ApiResponse,
        mut fetch: F,
    ) -> Result<ApiResponse, ClientError>
    where
        F: FnMut(DeferredToken) -> Fut,
        Fut: Future<Output = Result<ApiResponse, ClientError>>,
    {
        if !self.policy.enabled {
            return Ok(response);
        }

        let token = match inspect(&response) {
            Initial::Ready => return Ok(response),
            Initial::TriggeredSend => {
                debug!("202 carries a triggered mailing id, not a deferred result");
                return Ok(response);
            }
            Initial::Deferred(token) => token,
        };

        info!(
            deferred_id = %token,
            max_attempts = self.policy.max_attempts,
            "Request deferred, polling for result"
        );

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            let polled = fetch(token.clone()).await?;
            match polled.status() {
                STATUS_DEFERRED | STATUS_COMPILING => {
                    debug!(
                        deferred_id = %token,
                        attempt,
                        status = polled.status(),
                        "Deferred result not ready"
                    );
                }
                STATUS_OK | STATUS_NO_CONTENT => {
                    info!(deferred_id = %token, attempt, "Deferred result resolved");
                    return Ok(polled);
                }
                status => {
                    warn!(
                        deferred_id = %token,
                        attempt,
                        status,
                        "Unexpected status while polling deferred result"
                    );
                    if self.policy.fail_on_unexpected_status {
                        return Err(ClientError::UnexpectedStatus {
                            status,
                            body: polled.text().into_owned(),
                        });
                    }
                    return Ok(polled);
                }
            }
        }

        warn!(
            deferred_id = %token,
            attempts = self.policy.max_attempts,
            "Deferred result still pending, giving up"
        );

        Err(ClientError::DeferredExhausted {
            attempts: self.policy.max_attempts,
            deferred_id: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    fn policy(max_attempts: u32) -> DeferredPolicy {
        DeferredPolicy {
            interval: Duration::ZERO,
            max_attempts,
            ..DeferredPolicy::default()
        }
    }

    /// Run the resolver against a scripted sequence of poll responses and
    /// return the outcome with the tokens that were polled.
    async fn run(
        resolver: DeferredResolver,
        initial: ApiResponse,
        polls: Vec<ApiResponse>,
    ) -> (Result<ApiResponse, ClientError>, Vec<DeferredToken>) {
        let polls = RefCell::new(VecDeque::from(polls));
        let seen = RefCell::new(Vec::new());
        let result = resolver
            .resolve(initial, |token| {
                seen.borrow_mut().push(token);
                let next = polls.borrow_mut().pop_front();
                async move { Ok::<_, ClientError>(next.expect("poll beyond script")) }
            })
            .await;
        (result, seen.into_inner())
    }

    #[test]
    fn test_should_use_documented_defaults() {
        let policy = DeferredPolicy::default();
        assert!(policy.enabled);
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 20);
        assert!(!policy.fail_on_unexpected_status);
    }

    #[test]
    fn test_should_treat_non_json_202_body_as_token() {
        assert_eq!(
            inspect(&ApiResponse::new(202, "NOT")),
            Initial::Deferred(DeferredToken::new("NOT"))
        );
    }

    #[test]
    fn test_should_decode_invalid_utf8_token_lossily() {
        let response = ApiResponse::new(202, &b"job-\xff"[..]);
        assert_eq!(
            inspect(&response),
            Initial::Deferred(DeferredToken::new("job-\u{fffd}"))
        );
    }

    #[test]
    fn test_should_treat_json_without_marker_as_token() {
        let body = r#"{"deferred_id":"abc"}"#;
        assert_eq!(
            inspect(&ApiResponse::new(202, body)),
            Initial::Deferred(DeferredToken::new(body))
        );
    }

    #[test]
    fn test_should_ignore_null_triggered_marker() {
        let body = r#"{"mailing_triggered_id":null}"#;
        assert!(matches!(
            inspect(&ApiResponse::new(202, body)),
            Initial::Deferred(_)
        ));
    }

    #[test]
    fn test_should_only_inspect_202_responses() {
        for status in [200, 204, 400, 500, 503] {
            assert_eq!(inspect(&ApiResponse::new(status, "x")), Initial::Ready);
        }
    }

    #[tokio::test]
    async fn test_should_return_ready_response_without_polling() {
        let (result, seen) = run(
            DeferredResolver::new(policy(20)),
            ApiResponse::new(200, "ABC"),
            vec![],
        )
        .await;
        assert_eq!(result.unwrap().text(), "ABC");
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_should_poll_until_result_is_ready() {
        let (result, seen) = run(
            DeferredResolver::new(policy(20)),
            ApiResponse::new(202, "NOT"),
            vec![
                ApiResponse::new(202, "READY"),
                ApiResponse::new(202, "YET"),
                ApiResponse::new(200, "Finally!"),
            ],
        )
        .await;
        assert_eq!(result.unwrap().text(), "Finally!");
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|t| t.as_str() == "NOT"));
    }

    #[tokio::test]
    async fn test_should_keep_polling_while_compiling() {
        let (result, seen) = run(
            DeferredResolver::new(policy(5)),
            ApiResponse::new(202, "job-1"),
            vec![ApiResponse::new(503, ""), ApiResponse::new(204, "")],
        )
        .await;
        assert_eq!(result.unwrap().status(), 204);
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_should_give_up_while_still_compiling() {
        let (result, seen) = run(
            DeferredResolver::new(policy(2)),
            ApiResponse::new(202, "tok"),
            vec![ApiResponse::new(503, ""), ApiResponse::new(503, "")],
        )
        .await;
        assert!(matches!(
            result,
            Err(ClientError::DeferredExhausted { attempts: 2, ref deferred_id })
                if deferred_id == "tok"
        ));
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_should_fail_after_max_attempts() {
        let (result, seen) = run(
            DeferredResolver::new(policy(2)),
            ApiResponse::new(202, "First attempt"),
            vec![
                ApiResponse::new(202, "Second attempt"),
                ApiResponse::new(202, "Third attempt"),
                ApiResponse::new(200, "Finally!"),
            ],
        )
        .await;
        assert!(matches!(
            result,
            Err(ClientError::DeferredExhausted { attempts: 2, ref deferred_id })
                if deferred_id == "First attempt"
        ));
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_should_fail_immediately_with_zero_attempts() {
        let (result, seen) = run(
            DeferredResolver::new(policy(0)),
            ApiResponse::new(202, "job"),
            vec![],
        )
        .await;
        assert!(matches!(
            result,
            Err(ClientError::DeferredExhausted { attempts: 0, .. })
        ));
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_should_return_triggered_send_unchanged() {
        let body = r#"{"mailing_triggered_id":"abc123"}"#;
        let (result, seen) = run(
            DeferredResolver::new(policy(20)),
            ApiResponse::new(202, body),
            vec![],
        )
        .await;
        let response = result.unwrap();
        assert_eq!(response.status(), 202);
        assert_eq!(response.text(), body);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_should_return_deferred_response_when_disabled() {
        let resolver = DeferredResolver::new(DeferredPolicy {
            enabled: false,
            ..policy(20)
        });
        let (result, seen) = run(resolver, ApiResponse::new(202, "job"), vec![]).await;
        assert_eq!(result.unwrap().status(), 202);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_should_return_unexpected_status_by_default() {
        let (result, seen) = run(
            DeferredResolver::new(policy(20)),
            ApiResponse::new(202, "job"),
            vec![ApiResponse::new(500, "boom")],
        )
        .await;
        assert_eq!(result.unwrap().status(), 500);
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_should_fail_on_unexpected_status_when_strict() {
        let resolver = DeferredResolver::new(DeferredPolicy {
            fail_on_unexpected_status: true,
            ..policy(20)
        });
        let (result, _) = run(
            resolver,
            ApiResponse::new(202, "job"),
            vec![ApiResponse::new(409, "conflict")],
        )
        .await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedStatus { status: 409, ref body }) if body == "conflict"
        ));
    }

    #[tokio::test]
    async fn test_should_propagate_fetch_errors() {
        let resolver = DeferredResolver::new(policy(3));
        let result = resolver
            .resolve(ApiResponse::new(202, "job"), |_| async {
                Err::<ApiResponse, _>(ClientError::Transport(crate::TransportError::Other(
                    "connection reset".to_owned(),
                )))
            })
            .await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
