//! Canonical forms used when building the signing string.
//!
//! The signing string is:
//!
//! ```text
//! api_id\n
//! api_ts\n
//! Path\n
//! DecodedQueryString
//! ```
//!
//! The query string is first built the way it is sent on the wire (RFC 3986
//! percent-encoding, parameters in insertion order) and then percent-decoded
//! once. The server reconstructs the same decoded form before checking the MAC.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::query::QueryParams;

/// Characters percent-encoded in query keys and values.
///
/// Everything except RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded, spaces become `%20`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Collapse a leading `//` in the path to a single `/`.
///
/// Some URL builders produce `//page/api/...` when the base URL ends with a
/// slash; the server signs the path with one slash.
///
/// # Examples
///
/// ```
/// use bsdtools_auth::canonical::normalize_path;
///
/// assert_eq!(normalize_path("//page/api/cons"), "/page/api/cons");
/// assert_eq!(normalize_path("/page/api/cons"), "/page/api/cons");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    if path.starts_with("//") {
        &path[1..]
    } else {
        path
    }
}

/// Build the wire query string: `k=v` pairs joined by `&`, percent-encoded.
///
/// # Examples
///
/// ```
/// use bsdtools_auth::QueryParams;
/// use bsdtools_auth::canonical::encode_query_string;
///
/// let query: QueryParams = [("name", "Jane Doe"), ("tag", "a&b")].into_iter().collect();
/// assert_eq!(encode_query_string(&query), "name=Jane%20Doe&tag=a%26b");
/// ```
#[must_use]
pub fn encode_query_string(query: &QueryParams) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-decode a query string once.
///
/// Separators are not interpreted, so a decoded `&` inside a value is
/// indistinguishable from a parameter separator. That is the form the server
/// signs.
#[must_use]
pub fn decode_query_string(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// The query component of the signing string.
///
/// # Examples
///
/// ```
/// use bsdtools_auth::QueryParams;
/// use bsdtools_auth::canonical::signing_query_string;
///
/// let query: QueryParams = [("name", "Jane Doe"), ("api_id", "123")].into_iter().collect();
/// assert_eq!(signing_query_string(&query), "name=Jane Doe&api_id=123");
/// ```
#[must_use]
pub fn signing_query_string(query: &QueryParams) -> String {
    decode_query_string(&encode_query_string(query))
}

/// Build the four-line signing string.
#[must_use]
pub fn build_signing_string(api_id: &str, api_ts: &str, path: &str, query: &str) -> String {
    let path = normalize_path(path);
    format!("{api_id}\n{api_ts}\n{path}\n{query}")
}

fn encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}
