//! Core types used across the API documents.

use serde::{Deserialize, Serialize};

/// A hyperlink to a related resource.
///
/// Links are used throughout OGC API documents to enable navigation and
/// discovery. The same resource is usually linked once per representation,
/// with `rel` set to `self` for the representation being returned and
/// `alternate` for the others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    /// The URI of the linked resource.
    pub href: String,

    /// The relationship type (e.g., "self", "alternate", "conformance").
    pub rel: String,

    /// The media type of the linked resource.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// A human-readable title for the link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The language of the linked resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
}

impl Link {
    /// Create a new link with required fields.
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            type_: None,
            title: None,
            hreflang: None,
        }
    }

    /// Set the media type.
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the language of the target resource.
    pub fn with_hreflang(mut self, hreflang: impl Into<String>) -> Self {
        self.hreflang = Some(hreflang.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_builder() {
        let link = Link::new("http://localhost:5000/conformance", "conformance")
            .with_type("application/json")
            .with_title("Conformance")
            .with_hreflang("en-US");

        assert_eq!(link.rel, "conformance");
        assert_eq!(link.type_.as_deref(), Some("application/json"));
        assert_eq!(link.hreflang.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_link_serialization_skips_empty_fields() {
        let link = Link::new("http://localhost:5000", "self");
        let json = serde_json::to_value(&link).unwrap();

        assert_eq!(json["href"], "http://localhost:5000");
        assert!(json.get("type").is_none());
        assert!(json.get("title").is_none());
        assert!(json.get("hreflang").is_none());
    }

    #[test]
    fn test_link_type_renamed() {
        let link = Link::new("http://localhost:5000", "self").with_type("text/html");
        let json = serde_json::to_string(&link).unwrap();
        assert!(json.contains("\"type\":\"text/html\""));
    }
}
