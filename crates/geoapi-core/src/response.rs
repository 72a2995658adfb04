//! The response triple returned by business logic.

use bytes::Bytes;
use serde_json::Value;

use crate::headers::{get_header, Headers, CONTENT_TYPE};

/// Response body as produced by business logic.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// A structured document, serialized by the backend.
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Json(_) => false,
            Content::Text(text) => text.is_empty(),
            Content::Bytes(bytes) => bytes.is_empty(),
        }
    }

    /// The body as bytes; text is taken as UTF-8.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Content::Json(value) => Bytes::from(value.to_string()),
            Content::Text(text) => Bytes::from(text),
            Content::Bytes(bytes) => bytes,
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Json(value)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(Bytes::from(bytes))
    }
}

/// Headers, status and body of a response, before a backend turns it into
/// its own response type.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub headers: Headers,
    pub status: u16,
    pub content: Content,
}

/// How a backend should render an [`ApiResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Html,
    Json,
    Raw,
}

impl ApiResponse {
    pub fn new(headers: Headers, status: u16, content: impl Into<Content>) -> Self {
        Self {
            headers,
            status,
            content: content.into(),
        }
    }

    pub fn ok(headers: Headers, content: impl Into<Content>) -> Self {
        Self::new(headers, 200, content)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }

    /// HTML when `Content-Type` is exactly `text/html`, JSON for structured
    /// content, raw otherwise.
    pub fn representation(&self) -> Representation {
        if self.header(CONTENT_TYPE) == Some("text/html") {
            Representation::Html
        } else if matches!(self.content, Content::Json(_)) {
            Representation::Json
        } else {
            Representation::Raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_type(mime: &str, content: impl Into<Content>) -> ApiResponse {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), mime.to_string());
        ApiResponse::ok(headers, content)
    }

    #[test]
    fn test_representation_html_exact_type() {
        assert_eq!(with_type("text/html", "<p>hi</p>").representation(), Representation::Html);
        assert_eq!(
            with_type("text/html; charset=utf-8", "<p>hi</p>").representation(),
            Representation::Raw
        );
    }

    #[test]
    fn test_representation_json_and_raw() {
        assert_eq!(
            with_type("application/json", json!({"a": 1})).representation(),
            Representation::Json
        );
        assert_eq!(
            with_type("application/json", "{\"a\":1}").representation(),
            Representation::Raw
        );
        assert_eq!(
            with_type("image/png", vec![0x89u8, 0x50]).representation(),
            Representation::Raw
        );
    }

    #[test]
    fn test_content_into_bytes() {
        assert_eq!(Content::from("abc").into_bytes(), Bytes::from_static(b"abc"));
        assert_eq!(Content::from(json!([1, 2])).into_bytes(), Bytes::from_static(b"[1,2]"));
        assert!(Content::from(Vec::new()).is_empty());
    }
}
