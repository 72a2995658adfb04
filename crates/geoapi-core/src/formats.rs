//! Output format negotiation.
//!
//! The `f` query parameter names a format explicitly and is returned as-is;
//! otherwise the `Accept` header is scanned against [`FORMAT_TYPES`] in table
//! order. Whether the resulting name is acceptable is a separate check
//! ([`is_valid`]) so endpoints can allow extra formats of their own.

use tracing::debug;

use crate::headers::{get_header, Headers, ACCEPT};
use crate::request::QueryParams;

/// Query parameter that overrides the `Accept` header.
pub const QUERY_PARAM: &str = "f";

pub const F_HTML: &str = "html";
pub const F_JSONLD: &str = "jsonld";
pub const F_JSON: &str = "json";
pub const F_PNG: &str = "png";
pub const F_MVT: &str = "mvt";

/// Format names and MIME types, in header negotiation precedence order.
pub const FORMAT_TYPES: &[(&str, &str)] = &[
    (F_HTML, "text/html"),
    (F_JSONLD, "application/ld+json"),
    (F_JSON, "application/json"),
    (F_PNG, "image/png"),
    (F_MVT, "application/vnd.mapbox-vector-tile"),
];

/// Negotiate the request format.
///
/// Quality values in the `Accept` header are ignored: the first table entry
/// whose MIME type is listed wins, whatever its weight.
pub fn negotiate_format(
    params: &QueryParams,
    headers: &Headers,
    table: &[(&str, &str)],
) -> Option<String> {
    if let Some(f) = params.get(QUERY_PARAM) {
        if !f.trim().is_empty() {
            return Some(f.to_string());
        }
    }

    let accept = get_header(headers, ACCEPT)?;
    let accepted: Vec<&str> = accept
        .split(',')
        .map(|entry| entry.split(';').next().unwrap_or_default().trim())
        .filter(|media_type| !media_type.is_empty())
        .collect();

    let format = table
        .iter()
        .find(|(_, mime)| accepted.contains(mime))
        .map(|(name, _)| name.to_string());

    debug!(accept, format = ?format, "Negotiated format from Accept header");
    format
}

/// Whether a negotiated format can be served.
///
/// `None` (nothing requested) is always valid. Table names match
/// case-insensitively; `additional` entries match exactly.
pub fn is_valid(format: Option<&str>, table: &[(&str, &str)], additional: &[&str]) -> bool {
    match format {
        None => true,
        Some(f) => {
            table.iter().any(|(name, _)| name.eq_ignore_ascii_case(f)) || additional.contains(&f)
        }
    }
}

/// MIME type for a format name, if it is in the table.
pub fn mime_type<'a>(table: &[(&str, &'a str)], format: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(format))
        .map(|(_, mime)| *mime)
}
