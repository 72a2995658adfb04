//! API rules: versioned URL prefixes and trailing-slash policy.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// The web framework backends a server can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Blocking,
    Axum,
    Hyper,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Blocking, Backend::Axum, Backend::Hyper];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Blocking => "blocking",
            Backend::Axum => "axum",
            Backend::Hyper => "hyper",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `server.api_rules` as written in the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiRulesConfig {
    /// Semantic API version, e.g. `1.2.3`.
    pub api_version: Option<String>,
    /// Redirect the bare prefix and reject other trailing slashes.
    pub strict_slashes: bool,
    /// Path prefix; may contain `{api_version}`, `{api_major}`,
    /// `{api_minor}` and `{api_build}`.
    pub url_prefix: String,
    pub url_prefixes: UrlPrefixes,
    /// Response header carrying the API version.
    pub version_header: Option<String>,
}

/// Per-backend overrides of `url_prefix`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UrlPrefixes {
    pub blocking: Option<String>,
    pub axum: Option<String>,
    pub hyper: Option<String>,
}

impl UrlPrefixes {
    fn get(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Blocking => self.blocking.as_deref(),
            Backend::Axum => self.axum.as_deref(),
            Backend::Hyper => self.hyper.as_deref(),
        }
    }
}

/// What to do with a request path before routing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashRule {
    /// Route the path as is.
    Continue,
    /// Route this path instead.
    Rewrite(String),
    /// Answer with a temporary redirect to this location.
    Redirect(String),
    /// Answer with a bare 404.
    NotFound,
}

/// Validated API rules with the prefix of every backend resolved.
#[derive(Debug, Clone)]
pub struct ApiRules {
    api_version: Option<String>,
    strict_slashes: bool,
    version_header: Option<String>,
    prefixes: HashMap<Backend, String>,
}

impl ApiRules {
    pub fn from_config(config: &ApiRulesConfig) -> ConfigResult<Self> {
        let version = match &config.api_version {
            Some(v) => Some(parse_version(v)?),
            None => None,
        };

        let mut prefixes = HashMap::new();
        for backend in Backend::ALL {
            let template = config
                .url_prefixes
                .get(backend)
                .unwrap_or(config.url_prefix.as_str());
            let expanded = expand_prefix(template, version.as_ref())?;
            prefixes.insert(backend, normalize_prefix(&expanded)?);
        }

        Ok(Self {
            api_version: config.api_version.clone(),
            strict_slashes: config.strict_slashes,
            version_header: config.version_header.clone(),
            prefixes,
        })
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn strict_slashes(&self) -> bool {
        self.strict_slashes
    }

    /// `(header name, api version)` when both are configured.
    pub fn version_header(&self) -> Option<(&str, &str)> {
        Some((self.version_header.as_deref()?, self.api_version.as_deref()?))
    }

    /// Mount prefix for `backend`: empty, or `/` followed by the prefix
    /// without a trailing slash.
    pub fn url_prefix(&self, backend: Backend) -> &str {
        self.prefixes.get(&backend).map(String::as_str).unwrap_or("")
    }

    /// Apply the trailing-slash policy to a request path.
    ///
    /// With strict slashes the bare prefix redirects to `prefix/` and any
    /// other path ending in `/` is not found. Otherwise a trailing slash is
    /// trimmed before routing.
    pub fn check_path(&self, backend: Backend, path: &str) -> SlashRule {
        let prefix = self.url_prefix(backend);
        let root = format!("{}/", prefix);

        if self.strict_slashes {
            if !prefix.is_empty() && path == prefix {
                return SlashRule::Redirect(root);
            }
            if path != root && path.ends_with('/') {
                return SlashRule::NotFound;
            }
            return SlashRule::Continue;
        }

        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            if trimmed.is_empty() {
                return SlashRule::Rewrite("/".to_string());
            }
            return SlashRule::Rewrite(trimmed.to_string());
        }
        SlashRule::Continue
    }

    /// The part of `path` below the prefix of `backend`, or `None` when the
    /// path is outside of it.
    pub fn strip_prefix<'a>(&self, backend: Backend, path: &'a str) -> Option<&'a str> {
        let prefix = self.url_prefix(backend);
        if prefix.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ApiVersion {
    full: String,
    major: String,
    minor: String,
    build: String,
}

fn parse_version(value: &str) -> ConfigResult<ApiVersion> {
    let value = value.trim();
    let parts: Vec<&str> = value.split('.').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if parts.len() > 3 || !numeric {
        return Err(ConfigError::ApiRules(format!(
            "api_version '{}' is not a semantic version",
            value
        )));
    }

    let part = |i: usize| parts.get(i).copied().unwrap_or("0").to_string();
    Ok(ApiVersion {
        full: value.to_string(),
        major: part(0),
        minor: part(1),
        build: part(2),
    })
}

fn expand_prefix(template: &str, version: Option<&ApiVersion>) -> ConfigResult<String> {
    if !template.contains('{') {
        return Ok(template.to_string());
    }

    let version = version.ok_or_else(|| {
        ConfigError::ApiRules(format!(
            "url_prefix '{}' uses version placeholders but api_version is not set",
            template
        ))
    })?;

    let expanded = template
        .replace("{api_version}", &version.full)
        .replace("{api_major}", &version.major)
        .replace("{api_minor}", &version.minor)
        .replace("{api_build}", &version.build);

    if expanded.contains('{') || expanded.contains('}') {
        return Err(ConfigError::ApiRules(format!(
            "url_prefix '{}' contains an unknown placeholder",
            template
        )));
    }
    Ok(expanded)
}

fn normalize_prefix(prefix: &str) -> ConfigResult<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '{' | '}'))
    {
        return Err(ConfigError::ApiRules(format!(
            "url_prefix '{}' is not a valid path",
            prefix
        )));
    }
    Ok(format!("/{}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_rules(yaml: &str) -> ApiRules {
        let config: ApiRulesConfig = serde_yaml::from_str(yaml).unwrap();
        ApiRules::from_config(&config).unwrap()
    }

    #[test]
    fn test_default_rules_have_no_prefix() {
        let rules = ApiRules::from_config(&ApiRulesConfig::default()).unwrap();
        for backend in Backend::ALL {
            assert_eq!(rules.url_prefix(backend), "");
        }
        assert!(!rules.strict_slashes());
        assert_eq!(rules.version_header(), None);
    }

    #[test]
    fn test_version_placeholders() {
        let rules = parse_rules("api_version: 1.2.3\nurl_prefix: 'v{api_major}/{api_minor}.{api_build}/'");
        assert_eq!(rules.url_prefix(Backend::Axum), "/v1/2.3");

        let rules = parse_rules("api_version: '2'\nurl_prefix: /api/{api_version}_{api_minor}");
        assert_eq!(rules.url_prefix(Backend::Hyper), "/api/2_0");
    }

    #[test]
    fn test_per_backend_overrides() {
        let rules = parse_rules(
            "api_version: 1.0.0\nurl_prefix: v{api_major}\nurl_prefixes:\n  hyper: /legacy/\n",
        );
        assert_eq!(rules.url_prefix(Backend::Axum), "/v1");
        assert_eq!(rules.url_prefix(Backend::Blocking), "/v1");
        assert_eq!(rules.url_prefix(Backend::Hyper), "/legacy");
    }

    #[test]
    fn test_invalid_rules() {
        let missing_version = ApiRulesConfig {
            url_prefix: "v{api_major}".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ApiRules::from_config(&missing_version),
            Err(ConfigError::ApiRules(_))
        ));

        let bad_version = ApiRulesConfig {
            api_version: Some("1.x".to_string()),
            ..Default::default()
        };
        assert!(ApiRules::from_config(&bad_version).is_err());

        let unknown_placeholder = ApiRulesConfig {
            api_version: Some("1.0".to_string()),
            url_prefix: "{api_patch}".to_string(),
            ..Default::default()
        };
        assert!(ApiRules::from_config(&unknown_placeholder).is_err());

        let bad_path = ApiRulesConfig {
            url_prefix: "api v1".to_string(),
            ..Default::default()
        };
        assert!(ApiRules::from_config(&bad_path).is_err());
    }

    #[test]
    fn test_version_header() {
        let rules = parse_rules("api_version: 1.2.3\nversion_header: X-API-Version");
        assert_eq!(rules.version_header(), Some(("X-API-Version", "1.2.3")));
    }

    #[test]
    fn test_strict_slashes_with_prefix() {
        let rules = parse_rules("strict_slashes: true\nurl_prefix: /api");

        assert_eq!(
            rules.check_path(Backend::Axum, "/api"),
            SlashRule::Redirect("/api/".to_string())
        );
        assert_eq!(rules.check_path(Backend::Axum, "/api/"), SlashRule::Continue);
        assert_eq!(rules.check_path(Backend::Axum, "/api/collections"), SlashRule::Continue);
        assert_eq!(rules.check_path(Backend::Axum, "/api/collections/"), SlashRule::NotFound);
    }

    #[test]
    fn test_strict_slashes_without_prefix() {
        let rules = parse_rules("strict_slashes: true");

        assert_eq!(rules.check_path(Backend::Hyper, "/"), SlashRule::Continue);
        assert_eq!(rules.check_path(Backend::Hyper, "/conformance"), SlashRule::Continue);
        assert_eq!(rules.check_path(Backend::Hyper, "/conformance/"), SlashRule::NotFound);
    }

    #[test]
    fn test_lenient_slashes_trim() {
        let rules = parse_rules("url_prefix: /api");

        assert_eq!(rules.check_path(Backend::Axum, "/api"), SlashRule::Continue);
        assert_eq!(
            rules.check_path(Backend::Axum, "/api/collections/"),
            SlashRule::Rewrite("/api/collections".to_string())
        );
        assert_eq!(rules.check_path(Backend::Axum, "/"), SlashRule::Continue);
        assert_eq!(
            rules.check_path(Backend::Axum, "//"),
            SlashRule::Rewrite("/".to_string())
        );
    }

    #[test]
    fn test_strip_prefix() {
        let rules = parse_rules("url_prefix: /api");

        assert_eq!(rules.strip_prefix(Backend::Axum, "/api"), Some(""));
        assert_eq!(rules.strip_prefix(Backend::Axum, "/api/"), Some("/"));
        assert_eq!(rules.strip_prefix(Backend::Axum, "/api/conformance"), Some("/conformance"));
        assert_eq!(rules.strip_prefix(Backend::Axum, "/apix"), None);
        assert_eq!(rules.strip_prefix(Backend::Axum, "/other"), None);

        let bare = ApiRules::from_config(&ApiRulesConfig::default()).unwrap();
        assert_eq!(bare.strip_prefix(Backend::Axum, "/conformance"), Some("/conformance"));
    }
}
