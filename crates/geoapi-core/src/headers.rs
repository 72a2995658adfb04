//! Plain string header maps shared by requests and responses.

use std::collections::HashMap;

/// A header map with string keys and values.
///
/// Keys keep the casing they were inserted with; use [`get_header`] for
/// lookups.
pub type Headers = HashMap<String, String>;

pub const ACCEPT: &str = "Accept";
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LANGUAGE: &str = "Content-Language";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const X_POWERED_BY: &str = "X-Powered-By";

/// Default MIME type of every response unless a format overrides it.
pub const DEFAULT_MIMETYPE: &str = "application/json; charset=UTF-8";

/// Static product string sent in `X-Powered-By`.
pub fn powered_by() -> String {
    format!("geoapi {}", env!("CARGO_PKG_VERSION"))
}

/// The header set every response starts from.
pub fn default_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert(CONTENT_TYPE.to_string(), DEFAULT_MIMETYPE.to_string());
    headers.insert(X_POWERED_BY.to_string(), powered_by());
    headers
}

/// Case-insensitive header lookup.
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Insert a header, replacing any existing entry regardless of its casing.
pub fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.into());
}

/// Remove a header regardless of its casing.
pub fn remove_header(headers: &mut Headers, name: &str) -> Option<String> {
    let key = headers.keys().find(|k| k.eq_ignore_ascii_case(name)).cloned()?;
    headers.remove(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let headers = default_headers();
        assert_eq!(get_header(&headers, CONTENT_TYPE), Some(DEFAULT_MIMETYPE));
        assert!(get_header(&headers, X_POWERED_BY).unwrap().starts_with("geoapi "));
    }

    #[test]
    fn test_get_header_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("accept-language".to_string(), "fr".to_string());
        assert_eq!(get_header(&headers, "Accept-Language"), Some("fr"));
        assert_eq!(get_header(&headers, "ACCEPT-LANGUAGE"), Some("fr"));
        assert_eq!(get_header(&headers, "Accept"), None);
    }

    #[test]
    fn test_set_header_replaces_other_casing() {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        set_header(&mut headers, CONTENT_TYPE, "text/html");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(CONTENT_TYPE).map(String::as_str), Some("text/html"));
    }

    #[test]
    fn test_remove_header() {
        let mut headers = Headers::new();
        headers.insert("content-encoding".to_string(), "gzip".to_string());
        assert_eq!(remove_header(&mut headers, CONTENT_ENCODING).as_deref(), Some("gzip"));
        assert!(headers.is_empty());
        assert_eq!(remove_header(&mut headers, CONTENT_ENCODING), None);
    }
}
