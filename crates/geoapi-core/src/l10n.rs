//! Locale parsing, matching and resolution.
//!
//! A request can ask for a language in two ways: the `lang` query parameter
//! or the `Accept-Language` header. Both are matched against the languages
//! the server declares in its configuration; the first declared language is
//! the default and is returned whenever nothing better matches.
//!
//! Resolution keeps the untouched string of the first source that produced
//! a value (`raw`), so that data providers with a different set of supported
//! languages can match it again on their own.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::headers::{get_header, Headers, ACCEPT_LANGUAGE};
use crate::request::QueryParams;

/// Query parameter that overrides the `Accept-Language` header.
pub const QUERY_PARAM: &str = "lang";

/// Errors for locale identifiers.
#[derive(Debug, Error, PartialEq)]
pub enum LocaleError {
    #[error("invalid locale identifier '{0}'")]
    Invalid(String),

    #[error("no supported locales specified")]
    Empty,
}

/// A language with an optional territory, e.g. `en` or `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    territory: Option<String>,
}

impl Locale {
    /// Build a locale from already valid parts, normalizing their case.
    pub fn new(language: &str, territory: Option<&str>) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            territory: territory.map(str::to_ascii_uppercase),
        }
    }

    /// Parse `en`, `en-US`, `en_US` or `zh-Hant-TW` style identifiers.
    ///
    /// Script subtags are accepted but dropped.
    pub fn parse(value: &str) -> Result<Self, LocaleError> {
        let invalid = || LocaleError::Invalid(value.to_string());

        let mut subtags = value.trim().split(|c: char| c == '-' || c == '_');
        let language = subtags.next().unwrap_or_default();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(invalid());
        }

        let mut territory = None;
        for subtag in subtags {
            if territory.is_some() {
                return Err(invalid());
            }
            let alphabetic = subtag.chars().all(|c| c.is_ascii_alphabetic());
            match subtag.len() {
                4 if alphabetic => continue,
                2 if alphabetic => territory = Some(subtag),
                3 if subtag.chars().all(|c| c.is_ascii_digit()) => territory = Some(subtag),
                _ => return Err(invalid()),
            }
        }

        Ok(Self::new(language, territory))
    }

    /// The system locale, used for responses that ignore language settings.
    pub fn system() -> Self {
        Self::new("en", Some("US"))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn territory(&self) -> Option<&str> {
        self.territory.as_deref()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.territory {
            Some(territory) => write!(f, "{}-{}", self.language, territory),
            None => f.write_str(&self.language),
        }
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The ordered set of locales a server (or a provider) supports.
///
/// Never empty; the first entry is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportedLocales {
    locales: Vec<Locale>,
}

impl SupportedLocales {
    /// Parse a list of locale identifiers. Fails on an empty list or on the
    /// first identifier that cannot be parsed.
    pub fn new<I, S>(values: I) -> Result<Self, LocaleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let locales = values
            .into_iter()
            .map(|v| Locale::parse(v.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if locales.is_empty() {
            return Err(LocaleError::Empty);
        }
        Ok(Self { locales })
    }

    pub fn default_locale(&self) -> &Locale {
        &self.locales[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locale> {
        self.locales.iter()
    }

    pub fn contains(&self, locale: &Locale) -> bool {
        self.locales.contains(locale)
    }

    /// Find the best supported locale for an `Accept-Language` style string.
    ///
    /// Tags are ranked by their `q=` weight; tags without a weight rank by
    /// position, ahead of weighted ones. Invalid tags, `*` and tags with
    /// `q=0` are ignored. A tag matching language and territory returns that
    /// locale; a tag matching only the language returns the first supported
    /// locale for that language. Without any match the default is returned.
    pub fn best_match(&self, accept_languages: &str) -> Locale {
        let tags: Vec<&str> = accept_languages.split(',').collect();
        let num_tags = tags.len();

        let mut requested: Vec<(f32, Locale)> = Vec::new();
        for (i, tag) in tags.iter().enumerate() {
            let mut parts = tag.split(';');
            let lang = parts.next().unwrap_or_default().trim();
            if lang.is_empty() {
                continue;
            }

            let locale = match Locale::parse(lang) {
                Ok(locale) => locale,
                Err(_) => {
                    debug!(tag = lang, "Ignoring invalid accept-language tag");
                    continue;
                }
            };

            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok());
            let weight = match weight {
                Some(q) if !q.is_finite() || q <= 0.0 => continue,
                Some(q) => q,
                None => (num_tags - i) as f32,
            };

            requested.push((weight, locale));
        }

        // Stable: equal weights keep header order
        requested.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, locale) in &requested {
            let mut same_language = self
                .locales
                .iter()
                .filter(|s| s.language() == locale.language())
                .peekable();

            let first = match same_language.peek() {
                Some(first) => (*first).clone(),
                None => continue,
            };

            if same_language.any(|s| s.territory() == locale.territory()) {
                return locale.clone();
            }
            return first;
        }

        self.default_locale().clone()
    }
}

/// Which request source a locale string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocaleSource {
    QueryParam,
    Header,
}

/// The `lang` query parameter, if present and not blank.
pub fn locale_from_params(params: &QueryParams) -> Option<&str> {
    params.get(QUERY_PARAM).filter(|v| !v.trim().is_empty())
}

/// The `Accept-Language` header, if present and not blank.
pub fn locale_from_headers(headers: &Headers) -> Option<&str> {
    get_header(headers, ACCEPT_LANGUAGE).filter(|v| !v.trim().is_empty())
}

/// Resolve the request locale from query parameters and headers.
///
/// Returns `(raw, locale)`: `raw` is the untouched string of the first
/// source that had a value, `locale` is always a member of `supported`.
/// The query parameter wins even when it resolves to the default locale;
/// a header only wins when it resolves to something other than the default.
pub fn resolve_locale(
    params: &QueryParams,
    headers: &Headers,
    supported: &SupportedLocales,
) -> (Option<String>, Locale) {
    let default_locale = supported.default_locale();
    let mut raw: Option<String> = None;

    let sources = [
        (LocaleSource::QueryParam, locale_from_params(params)),
        (LocaleSource::Header, locale_from_headers(headers)),
    ];

    for (source, value) in sources {
        let value = match value {
            Some(value) => value,
            None => continue,
        };

        if raw.is_none() {
            raw = Some(value.to_string());
        }

        let locale = supported.best_match(value);
        if locale != *default_locale || source == LocaleSource::QueryParam {
            debug!(?source, requested = value, resolved = %locale, "Resolved request locale");
            return (raw, locale);
        }
    }

    (raw, default_locale.clone())
}

/// A configuration value given either once or per language.
///
/// ```yaml
/// title: Large Lakes
/// description:
///   en: lakes of the world
///   fr: lacs du monde
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Localized<T> {
    Plain(T),
    Translations(BTreeMap<String, T>),
}

impl<T> Localized<T> {
    /// Pick the value for `locale`: exact locale, then same language, then
    /// the first translation.
    pub fn translate(&self, locale: &Locale) -> Option<&T> {
        match self {
            Localized::Plain(value) => Some(value),
            Localized::Translations(values) => {
                let parsed: Vec<(Locale, &T)> = values
                    .iter()
                    .filter_map(|(k, v)| Locale::parse(k).ok().map(|l| (l, v)))
                    .collect();

                parsed
                    .iter()
                    .find(|(l, _)| l == locale)
                    .or_else(|| parsed.iter().find(|(l, _)| l.language() == locale.language()))
                    .map(|(_, v)| *v)
                    .or_else(|| values.values().next())
            }
        }
    }
}

impl<T: Default> Default for Localized<T> {
    fn default() -> Self {
        Localized::Plain(T::default())
    }
}
