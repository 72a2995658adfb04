//! Business logic for the API routes.
//!
//! Every handler has the [`crate::routes::HandlerFn`] signature and is
//! backend agnostic. Health and metrics live outside the API prefix and are
//! axum-only.

pub mod collections;
pub mod conformance;
pub mod health;
pub mod html;
pub mod landing;
pub mod processes;

use geoapi_core::formats::{F_HTML, F_JSON, F_JSONLD};
use geoapi_core::{Api, ApiRequest, ApiResponse, Locale, Localized};
use geoapi_protocol::{media_types, Link};
use serde::Serialize;

/// Respond with `document` as HTML when the request asks for it, JSON
/// otherwise.
fn respond<T: Serialize>(
    api: &Api,
    request: &ApiRequest,
    document: &T,
    render_html: impl FnOnce(&T) -> String,
) -> anyhow::Result<ApiResponse> {
    let headers = api.response_headers(request);

    if wants_html(request) {
        return Ok(ApiResponse::ok(headers, render_html(document)));
    }

    let value = serde_json::to_value(document)?;
    Ok(ApiResponse::ok(headers, api.json_content(value)))
}

fn wants_html(request: &ApiRequest) -> bool {
    request
        .format()
        .is_some_and(|f| f.eq_ignore_ascii_case(F_HTML))
}

/// Links to `href` in every representation, `self` for the one requested.
fn format_links(request: &ApiRequest, href: &str, title: &str) -> Vec<Link> {
    [
        (F_JSON, media_types::JSON, "JSON"),
        (F_JSONLD, media_types::JSON_LD, "RDF (JSON-LD)"),
        (F_HTML, media_types::HTML, "HTML"),
    ]
    .into_iter()
    .map(|(format, mime, label)| {
        Link::new(format!("{}?f={}", href, format), request.get_linkrel(format))
            .with_type(mime)
            .with_title(format!("{} as {}", title, label))
    })
    .collect()
}

/// Configured text in the request language, `None` when empty.
fn localized(value: &Localized<String>, locale: &Locale) -> Option<String> {
    value
        .translate(locale)
        .filter(|text| !text.is_empty())
        .cloned()
}
