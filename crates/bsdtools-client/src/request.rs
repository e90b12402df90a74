//! Outgoing request description.
//!
//! An [`ApiRequest`] is what the client hands to a [`Transport`](crate::Transport):
//! method, endpoint URL (without query), ordered query parameters, body and
//! the auth context the signing hook needs.

use bsdtools_auth::canonical::encode_query_string;
use bsdtools_auth::{AuthContext, QueryParams};
use bytes::Bytes;
use http::Method;
use url::Url;

/// Content type used for urlencoded form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type prefix of multipart bodies; the transport appends the boundary.
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Part content.
    pub content: Bytes,
    /// File name, for file uploads.
    pub filename: Option<String>,
    /// Value for the part's `Content-Type` header.
    pub content_type: Option<String>,
}

impl MultipartPart {
    /// A plain text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Bytes::from(value.into()),
            filename: None,
            content_type: None,
        }
    }

    /// A file upload.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            filename: Some(filename.into()),
            content_type: None,
        }
    }

    /// Set the part's content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Request body variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes, sent as-is with an optional content type.
    Raw {
        /// Body content.
        content: Bytes,
        /// Value for the `Content-Type` header.
        content_type: Option<String>,
    },
    /// Form parameters, urlencoded.
    Form(Vec<(String, String)>),
    /// `multipart/form-data` parts. Encoded by the transport, which owns the boundary.
    Multipart(Vec<MultipartPart>),
}

impl RequestBody {
    /// A raw body without a content type.
    #[must_use]
    pub fn raw(content: impl Into<Bytes>) -> Self {
        Self::Raw {
            content: content.into(),
            content_type: None,
        }
    }

    /// A form body from `(name, value)` pairs.
    pub fn form<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A multipart body from its parts.
    pub fn multipart(parts: impl IntoIterator<Item = MultipartPart>) -> Self {
        Self::Multipart(parts.into_iter().collect())
    }

    /// Whether there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Raw { content, .. } => content.is_empty(),
            Self::Form(params) => params.is_empty(),
            Self::Multipart(parts) => parts.is_empty(),
        }
    }

    /// Encode into bytes and content type.
    ///
    /// `None` for an empty body and for multipart bodies, which have no fixed
    /// encoding until the transport picks a boundary.
    #[must_use]
    pub fn encode(&self) -> Option<(Bytes, Option<String>)> {
        match self {
            Self::Empty | Self::Multipart(_) => None,
            Self::Raw {
                content,
                content_type,
            } => Some((content.clone(), content_type.clone())),
            Self::Form(params) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params)
                    .finish();
                Some((Bytes::from(encoded), Some(FORM_CONTENT_TYPE.to_owned())))
            }
        }
    }
}

/// A single outgoing API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint URL without a query component.
    pub url: Url,
    /// Query parameters in wire order.
    pub query: QueryParams,
    /// Request body.
    pub body: RequestBody,
    /// Credentials for the signing hook.
    pub auth: Option<AuthContext>,
}

impl ApiRequest {
    /// Create a request with an empty query and body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: QueryParams::new(),
            body: RequestBody::Empty,
            auth: None,
        }
    }

    /// Replace the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Attach an auth context.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// The URL path the signature is computed over.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The URL that goes on the wire, query encoded in insertion order.
    ///
    /// Any query already present on [`ApiRequest::url`] is replaced.
    ///
    /// # Examples
    ///
    /// ```
    /// use bsdtools_client::ApiRequest;
    /// use http::Method;
    ///
    /// let url = url::Url::parse("https://example.com/page/api/cons").unwrap();
    /// let mut request = ApiRequest::new(Method::GET, url);
    /// request.query.set("name", "Jane Doe");
    /// assert_eq!(
    ///     request.wire_url().as_str(),
    ///     "https://example.com/page/api/cons?name=Jane%20Doe"
    /// );
    /// ```
    #[must_use]
    pub fn wire_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&encode_query_string(&self.query)));
        }
        url
    }
}
