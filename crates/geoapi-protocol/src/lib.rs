//! OGC API - Common protocol documents
//!
//! This crate provides the response documents shared by every OGC API
//! resource served by geoapi: links, the landing page, the conformance
//! declaration, collection listings and the OGC exception body.
//!
//! # Example
//!
//! ```rust
//! use geoapi_protocol::{LandingPage, Link};
//!
//! let landing = LandingPage::new(
//!     "geoapi",
//!     "OGC API server",
//!     "http://localhost:5000",
//! );
//! assert!(landing.links.iter().any(|l| l.rel == "conformance"));
//! ```

pub mod collections;
pub mod errors;
pub mod responses;
pub mod types;

pub use collections::{Collection, CollectionList};
pub use errors::ApiError;
pub use responses::{ConformanceClasses, ExceptionResponse, LandingPage};
pub use types::Link;

/// OGC API conformance class URIs
pub mod conformance {
    /// OGC API - Common core
    pub const COMMON_CORE: &str = "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/core";
    /// Landing page
    pub const LANDING_PAGE: &str =
        "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/landing-page";
    /// JSON encoding
    pub const JSON: &str = "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/json";
    /// HTML encoding
    pub const HTML: &str = "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/html";
    /// OpenAPI 3.0 service description
    pub const OAS30: &str = "http://www.opengis.net/spec/ogcapi-common-1/1.0/conf/oas30";
    /// Collections
    pub const COLLECTIONS: &str =
        "http://www.opengis.net/spec/ogcapi-common-2/1.0/conf/collections";
}

/// Media types used in link relations
pub mod media_types {
    /// JSON media type
    pub const JSON: &str = "application/json";
    /// JSON-LD media type
    pub const JSON_LD: &str = "application/ld+json";
    /// HTML media type
    pub const HTML: &str = "text/html";
    /// OpenAPI JSON media type
    pub const OPENAPI_JSON: &str = "application/vnd.oai.openapi+json;version=3.0";
}
