//! The canonical request envelope.
//!
//! Every backend reduces its native request to [`RequestParts`] and builds an
//! [`ApiRequest`] from it. Construction resolves the locale and negotiates
//! the format once; the result is immutable.

use bytes::Bytes;
use tracing::debug;

use crate::formats::{self, F_JSON, FORMAT_TYPES};
use crate::headers::{
    default_headers, get_header, set_header, Headers, ACCEPT_ENCODING, CONTENT_ENCODING,
    CONTENT_LANGUAGE, CONTENT_TYPE,
};
use crate::l10n::{self, Locale, SupportedLocales};

const GZIP: &str = "gzip";

/// Decoded query string parameters, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode a raw (`a=1&b=2`) query string.
    pub fn from_query(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in request order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The fields every backend extracts from its native request.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub method: String,
    pub path: String,
    pub query: QueryParams,
    /// Header pairs as received; repeated names, in any casing, are joined
    /// with `", "`.
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestParts {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = QueryParams::from_query(query);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Optional overrides for [`ApiRequest::get_response_headers`].
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions {
    /// Content-Language to send regardless of the request locale.
    pub force_lang: Option<Locale>,
    /// Content-Type to send regardless of the request format.
    pub force_type: Option<String>,
    /// Content-Encoding to send regardless of `Accept-Encoding`.
    pub force_encoding: Option<String>,
    /// Whether the server may gzip responses for clients that accept it.
    pub allow_gzip: bool,
    /// Extra headers, applied before the computed ones.
    pub custom: Vec<(String, String)>,
}

impl HeaderOptions {
    pub fn with_lang(mut self, locale: Locale) -> Self {
        self.force_lang = Some(locale);
        self
    }

    pub fn with_type(mut self, mime: impl Into<String>) -> Self {
        self.force_type = Some(mime.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.force_encoding = Some(encoding.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.push((name.into(), value.into()));
        self
    }
}

/// A normalized inbound request with its negotiated locale and format.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: String,
    path_info: String,
    params: QueryParams,
    headers: Headers,
    data: Bytes,
    raw_locale: Option<String>,
    locale: Locale,
    format: Option<String>,
}

impl ApiRequest {
    /// Build an envelope without the request body.
    pub fn from_parts(parts: RequestParts, locales: &SupportedLocales) -> Self {
        Self::build(parts, locales, false)
    }

    /// Build an envelope that keeps the request body.
    pub fn with_data(parts: RequestParts, locales: &SupportedLocales) -> Self {
        Self::build(parts, locales, true)
    }

    fn build(parts: RequestParts, locales: &SupportedLocales, keep_body: bool) -> Self {
        let RequestParts {
            method,
            path,
            query,
            headers: header_pairs,
            body,
        } = parts;

        let mut headers = Headers::new();
        for (name, value) in header_pairs {
            let existing = headers
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(&name))
                .map(|(_, v)| v);
            match existing {
                Some(existing) => {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                None => {
                    headers.insert(name, value);
                }
            }
        }

        let (raw_locale, locale) = l10n::resolve_locale(&query, &headers, locales);
        let format = formats::negotiate_format(&query, &headers, FORMAT_TYPES);

        let data = match body {
            Some(body) if keep_body => body,
            _ => Bytes::new(),
        };

        let path_info = path.trim_matches('/').to_string();

        debug!(
            method = %method,
            path = %path_info,
            locale = %locale,
            format = ?format,
            "Normalized request"
        );

        Self {
            method: method.to_ascii_uppercase(),
            path_info,
            params: query,
            headers,
            data,
            raw_locale,
            locale,
            format,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path without leading or trailing slashes.
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Case-insensitive request header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }

    /// Request body; empty unless built with [`ApiRequest::with_data`].
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The untouched `lang` parameter or `Accept-Language` header, so that
    /// data providers can match it against their own languages.
    pub fn raw_locale(&self) -> Option<&str> {
        self.raw_locale.as_deref()
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Link relation for a link to this resource in `format`.
    ///
    /// `self` when it is the requested format, or when it is JSON and no
    /// format was requested; `alternate` otherwise.
    pub fn get_linkrel(&self, format: &str) -> &'static str {
        let format = format.to_ascii_lowercase();
        match self.format.as_deref() {
            Some(requested) if requested == format => "self",
            None if format == F_JSON => "self",
            _ => "alternate",
        }
    }

    /// Whether the requested format can be served.
    pub fn is_valid(&self, additional_formats: &[&str]) -> bool {
        formats::is_valid(self.format(), FORMAT_TYPES, additional_formats)
    }

    /// Headers for a response to this request.
    ///
    /// Always carries `Content-Type`, `Content-Language` and `X-Powered-By`.
    pub fn get_response_headers(&self, options: &HeaderOptions) -> Headers {
        let mut headers = default_headers();
        for (name, value) in &options.custom {
            set_header(&mut headers, name, value.as_str());
        }

        let lang = options.force_lang.as_ref().unwrap_or(&self.locale);
        set_header(&mut headers, CONTENT_LANGUAGE, lang.to_string());

        if let Some(mime) = &options.force_type {
            set_header(&mut headers, CONTENT_TYPE, mime.as_str());
        } else if let Some(mime) = self
            .format()
            .and_then(|f| formats::mime_type(FORMAT_TYPES, f))
        {
            set_header(&mut headers, CONTENT_TYPE, mime);
        }

        if let Some(encoding) = &options.force_encoding {
            set_header(&mut headers, CONTENT_ENCODING, encoding.as_str());
        } else if options.allow_gzip
            && self
                .header(ACCEPT_ENCODING)
                .is_some_and(|accepted| accepted.contains(GZIP))
        {
            set_header(&mut headers, CONTENT_ENCODING, GZIP);
        }

        headers
    }
}
