//! Request normalization and content negotiation core for geoapi.
//!
//! Every web backend turns its native request into an [`ApiRequest`]
//! (locale resolved, output format negotiated), runs business logic through
//! [`execute`] or [`execute_async`], and renders the resulting
//! [`ApiResponse`] in its own response type.
//!
//! # Example
//!
//! ```rust
//! use geoapi_core::{Api, GeoApiConfig, RequestParts};
//!
//! let config = GeoApiConfig::from_yaml_str("server:\n  languages: [en, fr]\n").unwrap();
//! let api = Api::new(config).unwrap();
//!
//! let request = api.request(
//!     RequestParts::new("GET", "/collections")
//!         .with_query("f=json")
//!         .with_header("Accept-Language", "fr-CA,fr;q=0.8"),
//! );
//! assert_eq!(request.format(), Some("json"));
//! assert_eq!(request.locale().to_string(), "fr");
//! assert_eq!(request.raw_locale(), Some("fr-CA,fr;q=0.8"));
//! ```

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod formats;
pub mod gzip;
pub mod headers;
pub mod l10n;
pub mod request;
pub mod response;
pub mod rules;

pub use api::{execute, Api, ExecuteOptions, Handler};
pub use bridge::{execute_async, run_blocking, BridgeError};
pub use config::{GeoApiConfig, ResourceConfig};
pub use error::{ConfigError, ConfigResult};
pub use gzip::apply_gzip;
pub use headers::Headers;
pub use l10n::{Locale, LocaleError, Localized, SupportedLocales};
pub use request::{ApiRequest, HeaderOptions, QueryParams, RequestParts};
pub use response::{ApiResponse, Content, Representation};
pub use rules::{ApiRules, Backend, SlashRule};
