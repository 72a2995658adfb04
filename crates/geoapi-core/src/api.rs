//! Shared API state and the synchronous request pipeline.
//!
//! ```text
//! RequestParts -> ApiRequest -> format check -> handler -> gzip -> backend response
//! ```
//!
//! Backends build the [`ApiRequest`], then call [`execute`] (or
//! [`crate::bridge::execute_async`] on an async runtime) and render the
//! returned [`ApiResponse`] themselves.

use std::time::Instant;

use geoapi_protocol::{ApiError, ExceptionResponse};
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::GeoApiConfig;
use crate::error::ConfigResult;
use crate::gzip::apply_gzip;
use crate::headers::{Headers, CONTENT_TYPE, DEFAULT_MIMETYPE};
use crate::l10n::{Locale, SupportedLocales};
use crate::request::{ApiRequest, HeaderOptions, RequestParts};
use crate::response::{ApiResponse, Content};
use crate::rules::{ApiRules, Backend};

/// Immutable server state shared by every request.
#[derive(Debug)]
pub struct Api {
    config: GeoApiConfig,
    locales: SupportedLocales,
    rules: ApiRules,
}

impl Api {
    /// Validate the configuration and build the server state.
    pub fn new(config: GeoApiConfig) -> ConfigResult<Self> {
        let locales = config.supported_locales()?;
        let rules = ApiRules::from_config(&config.server.api_rules)?;

        info!(
            default_locale = %locales.default_locale(),
            locales = locales.iter().count(),
            strict_slashes = rules.strict_slashes(),
            "API initialized"
        );

        Ok(Self {
            config,
            locales,
            rules,
        })
    }

    pub fn config(&self) -> &GeoApiConfig {
        &self.config
    }

    pub fn locales(&self) -> &SupportedLocales {
        &self.locales
    }

    pub fn rules(&self) -> &ApiRules {
        &self.rules
    }

    /// Public base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.server.public_url.trim_end_matches('/')
    }

    /// Normalize request parts against the server languages.
    pub fn request(&self, parts: RequestParts) -> ApiRequest {
        ApiRequest::from_parts(parts, &self.locales)
    }

    /// Like [`Api::request`], keeping the request body.
    pub fn request_with_data(&self, parts: RequestParts) -> ApiRequest {
        ApiRequest::with_data(parts, &self.locales)
    }

    /// Header options derived from the server configuration.
    pub fn header_options(&self) -> HeaderOptions {
        let mut options = HeaderOptions {
            allow_gzip: self.config.server.gzip_responses,
            ..Default::default()
        };
        if let Some((name, version)) = self.rules.version_header() {
            options = options.with_header(name, version);
        }
        options
    }

    /// Response headers for `request` under the server configuration.
    pub fn response_headers(&self, request: &ApiRequest) -> Headers {
        request.get_response_headers(&self.header_options())
    }

    /// JSON content, pretty printed when the server asks for it.
    pub fn json_content(&self, value: Value) -> Content {
        if self.config.server.pretty_print_responses {
            match serde_json::to_string_pretty(&value) {
                Ok(text) => Content::Text(text),
                Err(_) => Content::Json(value),
            }
        } else {
            Content::Json(value)
        }
    }

    /// Response for a request whose format cannot be served.
    ///
    /// Always in the system locale, whatever the request asked for.
    pub fn get_format_exception(&self, request: &ApiRequest) -> ApiResponse {
        let options = self.header_options().with_lang(Locale::system());
        let headers = request.get_response_headers(&options);
        let error = ApiError::InvalidParameterValue(format!(
            "Invalid format: {}",
            request.format().unwrap_or_default()
        ));
        self.exception_with_headers(headers, &error)
    }

    /// Response carrying an OGC exception document for `error`.
    pub fn exception_response(&self, request: &ApiRequest, error: &ApiError) -> ApiResponse {
        let headers = self.response_headers(request);
        self.exception_with_headers(headers, error)
    }

    fn exception_with_headers(&self, mut headers: Headers, error: &ApiError) -> ApiResponse {
        // Exception documents are JSON even for HTML requests
        crate::headers::set_header(&mut headers, CONTENT_TYPE, DEFAULT_MIMETYPE);

        let document: ExceptionResponse = error.to_exception();
        let body = match serde_json::to_value(&document) {
            Ok(value) => self.json_content(value),
            Err(_) => Content::Text(error.to_string()),
        };
        ApiResponse::new(headers, error.status_code(), body)
    }
}

/// Business logic invoked for a route.
///
/// `args` are the route's path parameters, in order. An `Err` is passed
/// through untouched and becomes the backend's own 500.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, api: &Api, request: &ApiRequest, args: &[String]) -> anyhow::Result<ApiResponse>;
}

impl<F> Handler for F
where
    F: Fn(&Api, &ApiRequest, &[String]) -> anyhow::Result<ApiResponse> + Send + Sync + 'static,
{
    fn call(&self, api: &Api, request: &ApiRequest, args: &[String]) -> anyhow::Result<ApiResponse> {
        self(api, request, args)
    }
}

/// Per-route execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Run the handler even when the requested format is unknown.
    pub skip_valid_check: bool,
    /// Formats this route serves on top of the global format table.
    pub additional_formats: &'static [&'static str],
}

impl ExecuteOptions {
    pub const DEFAULT: ExecuteOptions = ExecuteOptions {
        skip_valid_check: false,
        additional_formats: &[],
    };
}

/// The format exception response when `request` asks for a format this
/// route cannot serve, `None` when the handler should run.
pub fn check_format(
    api: &Api,
    request: &ApiRequest,
    options: &ExecuteOptions,
    backend: Backend,
) -> Option<ApiResponse> {
    if options.skip_valid_check || request.is_valid(options.additional_formats) {
        return None;
    }

    debug!(format = ?request.format(), %backend, "Rejecting unsupported format");
    counter!("geoapi_format_rejections_total", "backend" => backend.as_str()).increment(1);
    Some(api.get_format_exception(request))
}

/// Apply gzip to a handler response when its headers ask for it.
pub fn finish(response: ApiResponse) -> ApiResponse {
    let ApiResponse {
        mut headers,
        status,
        content,
    } = response;
    let content = apply_gzip(&mut headers, content);
    ApiResponse {
        headers,
        status,
        content,
    }
}

pub(crate) fn record_request(backend: Backend, started: Instant) {
    counter!("geoapi_requests_total", "backend" => backend.as_str()).increment(1);
    histogram!("geoapi_request_duration_ms", "backend" => backend.as_str())
        .record(started.elapsed().as_secs_f64() * 1000.0);
}

/// Run a request through the pipeline on the current thread.
pub fn execute<H: Handler + ?Sized>(
    api: &Api,
    handler: &H,
    request: &ApiRequest,
    args: &[String],
    options: &ExecuteOptions,
    backend: Backend,
) -> anyhow::Result<ApiResponse> {
    let started = Instant::now();

    let response = match check_format(api, request, options, backend) {
        Some(rejection) => rejection,
        None => handler.call(api, request, args)?,
    };

    record_request(backend, started);
    Ok(finish(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{get_header, CONTENT_ENCODING, CONTENT_LANGUAGE};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn api(yaml: &str) -> Api {
        Api::new(GeoApiConfig::from_yaml_str(yaml).unwrap()).unwrap()
    }

    fn echo(api: &Api, request: &ApiRequest, args: &[String]) -> anyhow::Result<ApiResponse> {
        let headers = api.response_headers(request);
        Ok(ApiResponse::ok(headers, json!({ "args": args })))
    }

    #[test]
    fn test_format_exception_uses_system_locale() {
        let api = api("server:\n  languages: [fr, en]\n");
        let request = api.request(RequestParts::new("GET", "/").with_query("f=xml&lang=fr"));

        let response = api.get_format_exception(&request);
        assert_eq!(response.status, 400);
        assert_eq!(get_header(&response.headers, CONTENT_LANGUAGE), Some("en-US"));
        assert_eq!(get_header(&response.headers, CONTENT_TYPE), Some(DEFAULT_MIMETYPE));
        assert!(get_header(&response.headers, "X-Powered-By").is_some());
        assert_eq!(
            response.content,
            Content::Json(json!({
                "code": "InvalidParameterValue",
                "type": "InvalidParameterValue",
                "description": "Invalid format: xml"
            }))
        );
    }

    #[test]
    fn test_exception_response_for_html_request_is_json() {
        let api = api("");
        let request = api.request(RequestParts::new("GET", "/").with_query("f=html"));

        let response =
            api.exception_response(&request, &ApiError::NotFound("Collection not found".into()));
        assert_eq!(response.status, 404);
        assert_eq!(get_header(&response.headers, CONTENT_TYPE), Some(DEFAULT_MIMETYPE));
    }

    #[test]
    fn test_execute_runs_handler_with_args() {
        let api = api("");
        let request = api.request(RequestParts::new("GET", "/collections/lakes"));
        let args = vec!["lakes".to_string()];

        let response =
            execute(&api, &echo, &request, &args, &ExecuteOptions::DEFAULT, Backend::Blocking)
                .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content, Content::Json(json!({ "args": ["lakes"] })));
    }

    #[test]
    fn test_invalid_format_never_calls_handler() {
        let api = api("");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let counting = move |api: &Api, request: &ApiRequest, args: &[String]| {
            counter.fetch_add(1, Ordering::SeqCst);
            echo(api, request, args)
        };

        let request = api.request(RequestParts::new("GET", "/").with_query("f=xml"));
        let response =
            execute(&api, &counting, &request, &[], &ExecuteOptions::DEFAULT, Backend::Blocking)
                .unwrap();

        assert_eq!(response.status, 400);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_additional_formats_and_skip_check() {
        let api = api("");
        let request = api.request(RequestParts::new("GET", "/").with_query("f=csv"));

        let csv = ExecuteOptions {
            additional_formats: &["csv"],
            ..ExecuteOptions::DEFAULT
        };
        let response = execute(&api, &echo, &request, &[], &csv, Backend::Blocking).unwrap();
        assert_eq!(response.status, 200);

        let skip = ExecuteOptions {
            skip_valid_check: true,
            ..ExecuteOptions::DEFAULT
        };
        let response = execute(&api, &echo, &request, &[], &skip, Backend::Blocking).unwrap();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_handler_error_propagates() {
        let api = api("");
        let failing = |_: &Api, _: &ApiRequest, _: &[String]| -> anyhow::Result<ApiResponse> {
            anyhow::bail!("provider connection refused")
        };

        let request = api.request(RequestParts::new("GET", "/"));
        let err = execute(&api, &failing, &request, &[], &ExecuteOptions::DEFAULT, Backend::Blocking)
            .unwrap_err();
        assert_eq!(err.to_string(), "provider connection refused");
    }

    #[test]
    fn test_execute_applies_gzip() {
        let api = api("server:\n  gzip: true\n");
        let request =
            api.request(RequestParts::new("GET", "/").with_header("Accept-Encoding", "gzip"));

        let response =
            execute(&api, &echo, &request, &[], &ExecuteOptions::DEFAULT, Backend::Blocking)
                .unwrap();
        assert_eq!(get_header(&response.headers, CONTENT_ENCODING), Some("gzip"));
        assert!(matches!(response.content, Content::Bytes(ref b) if b.starts_with(&[0x1f, 0x8b])));
    }

    #[test]
    fn test_pretty_print_and_version_header() {
        let api = api(
            "server:\n  pretty_print: true\n  api_rules:\n    api_version: 1.0.0\n    version_header: X-API-Version\n",
        );
        let request = api.request(RequestParts::new("GET", "/"));

        assert_eq!(get_header(&api.response_headers(&request), "X-API-Version"), Some("1.0.0"));
        assert_eq!(
            api.json_content(json!({"a": 1})),
            Content::Text("{\n  \"a\": 1\n}".to_string())
        );
    }
}
