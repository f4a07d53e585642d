//! Request model: method, body, and the immutable request value.

use std::path::PathBuf;

use bytes::Bytes;

use crate::endpoint::Endpoint;

/// Content type for JSON bodies.
pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Default content type for raw file and byte bodies (pre-compression).
pub(crate) const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// HTTP methods supported by the dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// An outgoing request payload.
///
/// A body is either a JSON value, raw content (from memory or a file), or a
/// multipart form whose fields may themselves carry a body. Any leaf body can
/// be wrapped with [`Body::gzip`], which leaves the advertised content type
/// unchanged and compresses the byte stream on its way to the wire.
#[derive(Debug)]
pub enum Body {
    /// JSON payload, sent as `application/json; charset=utf-8`.
    Json(serde_json::Value),
    /// In-memory bytes with an explicit content type.
    Bytes { data: Bytes, content_type: String },
    /// File content streamed from disk, `application/octet-stream` by default.
    File { path: PathBuf, content_type: String },
    /// Multipart form with named fields.
    Multipart(Vec<FormField>),
    /// Gzip streaming wrapper around another body. The inner body's content
    /// type is preserved; only the byte stream changes.
    Gzip(Box<Body>),
}

impl Body {
    /// JSON body from any serializable value.
    ///
    /// Serialization happens here so that a failing payload is reported at
    /// build time rather than mid-dispatch.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> crate::Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| crate::ApiLinkError::Serialization(e.to_string()))?;
        Ok(Body::Json(value))
    }

    /// Raw bytes body with the default `application/octet-stream` type.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Body::Bytes {
            data: data.into(),
            content_type: CONTENT_TYPE_OCTET_STREAM.to_string(),
        }
    }

    /// Raw bytes body with an explicit content type.
    pub fn bytes_with_content_type(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Body::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// File body streamed from disk with the default
    /// `application/octet-stream` type.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Body::File {
            path: path.into(),
            content_type: CONTENT_TYPE_OCTET_STREAM.to_string(),
        }
    }

    /// File body with an explicit content type.
    pub fn file_with_content_type(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Body::File {
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    /// Multipart form body.
    pub fn multipart(fields: Vec<FormField>) -> Self {
        Body::Multipart(fields)
    }

    /// Wrap this body in the gzip streaming wrapper.
    ///
    /// The advertised content type stays that of the inner body; the bytes
    /// written to the transport are gzip-compressed in a streaming fashion,
    /// without buffering the full payload.
    pub fn gzip(self) -> Self {
        Body::Gzip(Box::new(self))
    }

    /// The content type this body advertises. Multipart forms get their
    /// boundary-bearing content type from the transport at assembly time.
    pub fn content_type(&self) -> &str {
        match self {
            Body::Json(_) => CONTENT_TYPE_JSON,
            Body::Bytes { content_type, .. } => content_type,
            Body::File { content_type, .. } => content_type,
            Body::Multipart(_) => "multipart/form-data",
            Body::Gzip(inner) => inner.content_type(),
        }
    }

    /// Whether the outermost layer of this body is the gzip wrapper.
    pub(crate) fn is_gzipped(&self) -> bool {
        matches!(self, Body::Gzip(_))
    }
}

/// A named multipart form field.
#[derive(Debug)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

/// Value of a multipart form field: plain text or a nested body.
#[derive(Debug)]
pub enum FormValue {
    Text(String),
    Body {
        body: Box<Body>,
        filename: Option<String>,
    },
}

impl FormField {
    /// Plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    /// Field carrying a nested body (e.g. a file upload part).
    pub fn body(name: impl Into<String>, body: Body) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Body {
                body: Box::new(body),
                filename: None,
            },
        }
    }

    /// Field carrying a nested body with an explicit part filename.
    pub fn body_with_filename(
        name: impl Into<String>,
        body: Body,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Body {
                body: Box::new(body),
                filename: Some(filename.into()),
            },
        }
    }
}

/// An immutable request value, ready for dispatch.
///
/// Built once per call and never mutated after dispatch. Building performs no
/// network I/O; URL validation happens when the request is executed.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) endpoint: Endpoint,
    pub(crate) body: Option<Body>,
}

impl Request {
    /// Create a request with no body.
    pub fn new(method: Method, endpoint: impl Into<Endpoint>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    /// Create a request carrying a body.
    pub fn with_body(method: Method, endpoint: impl Into<Endpoint>, body: Body) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: Some(body),
        }
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request target.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_preserves_content_type() {
        let body = Body::file_with_content_type("/tmp/data.bin", "image/png").gzip();
        assert_eq!(body.content_type(), "image/png");
        assert!(body.is_gzipped());
    }

    #[test]
    fn test_nested_gzip_preserves_content_type() {
        let body = Body::bytes(vec![1, 2, 3]).gzip().gzip();
        assert_eq!(body.content_type(), CONTENT_TYPE_OCTET_STREAM);
    }

    #[test]
    fn test_json_content_type() {
        let body = Body::json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(body.content_type(), "application/json; charset=utf-8");
    }

    #[test]
    fn test_request_is_value() {
        let request = Request::new(Method::Get, "https://api.example.com/items");
        assert_eq!(request.method(), Method::Get);
        assert!(request.body().is_none());
    }
}
