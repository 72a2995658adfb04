//! API response documents.
//!
//! This module contains types for the landing page, conformance,
//! and the OGC exception body returned with every error response.

use serde::{Deserialize, Serialize};

use crate::conformance;
use crate::media_types;
use crate::types::Link;

/// Landing page response for the API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LandingPage {
    /// Title of the API.
    pub title: String,

    /// Description of the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links to related resources.
    pub links: Vec<Link>,
}

impl LandingPage {
    /// Create a new landing page with the standard navigation links.
    pub fn new(title: impl Into<String>, description: impl Into<String>, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let links = vec![
            Link::new(format!("{}/conformance", base_url), "conformance")
                .with_type(media_types::JSON)
                .with_title("Conformance"),
            Link::new(format!("{}/collections", base_url), "data")
                .with_type(media_types::JSON)
                .with_title("Collections"),
            Link::new(format!("{}/openapi", base_url), "service-desc")
                .with_type(media_types::OPENAPI_JSON)
                .with_title("The OpenAPI definition as JSON"),
            Link::new(format!("{}/openapi?f=html", base_url), "service-doc")
                .with_type(media_types::HTML)
                .with_title("The OpenAPI definition as HTML"),
        ];

        Self {
            title: title.into(),
            description: Some(description.into()),
            links,
        }
    }

    /// Append a link (builder pattern).
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }
}

/// Conformance declaration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConformanceClasses {
    /// List of conformance class URIs.
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

impl ConformanceClasses {
    /// Conformance classes for the resources served by geoapi.
    pub fn current() -> Self {
        Self {
            conforms_to: vec![
                conformance::COMMON_CORE.to_string(),
                conformance::LANDING_PAGE.to_string(),
                conformance::JSON.to_string(),
                conformance::HTML.to_string(),
                conformance::OAS30.to_string(),
                conformance::COLLECTIONS.to_string(),
            ],
        }
    }

    /// Add a conformance class.
    pub fn with_class(mut self, class: &str) -> Self {
        if !self.contains(class) {
            self.conforms_to.push(class.to_string());
        }
        self
    }

    /// Check if a conformance class is declared.
    pub fn contains(&self, class: &str) -> bool {
        self.conforms_to.iter().any(|c| c == class)
    }
}

/// OGC exception body.
///
/// Serialized as `{"code": ..., "type": ..., "description": ...}` where
/// `type` repeats the exception code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// OGC exception code (e.g. `InvalidParameterValue`).
    pub code: String,

    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable description.
    pub description: String,
}

impl ExceptionResponse {
    /// Create a new exception document.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            type_: code.clone(),
            code,
            description: description.into(),
        }
    }

    /// Create an `InvalidParameterValue` exception.
    pub fn invalid_parameter_value(description: impl Into<String>) -> Self {
        Self::new("InvalidParameterValue", description)
    }

    /// Create a `NotFound` exception.
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new("NotFound", description)
    }

    /// Create a `NoApplicableCode` exception.
    pub fn no_applicable_code(description: impl Into<String>) -> Self {
        Self::new("NoApplicableCode", description)
    }
}
