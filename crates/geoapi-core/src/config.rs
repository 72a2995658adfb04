//! Server configuration.
//!
//! Loaded once at startup from a YAML file and never mutated afterwards.
//! Supports environment variable substitution using `${VAR}` and
//! `${VAR:-default}` syntax, and accepts the short legacy key names of older
//! configuration files (`gzip`, `cors`, `url`, ...) through a single alias
//! table applied before deserialization.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::headers::DEFAULT_MIMETYPE;
use crate::l10n::{Localized, SupportedLocales};
use crate::rules::{ApiRules, ApiRulesConfig};

/// Legacy key names: `(section path, legacy key, canonical key)`.
pub const LEGACY_KEY_ALIASES: &[(&[&str], &str, &str)] = &[
    (&["server"], "admin", "enable_admin"),
    (&["server"], "cors", "enable_cors"),
    (&["server"], "gzip", "gzip_responses"),
    (&["server"], "manager", "process_manager"),
    (&["server"], "pretty_print", "pretty_print_responses"),
    (&["server"], "url", "public_url"),
    (&["metadata", "contact"], "stateorprovince", "state_or_province"),
    (&["metadata", "contact"], "postalcode", "postal_code"),
    (&["metadata", "contact"], "hours", "hours_of_service"),
];

// ============================================================================
// Configuration types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeoApiConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metadata: MetadataConfig,
    /// Configured resources, in file order.
    #[serde(deserialize_with = "ordered_resources")]
    pub resources: Vec<(String, ResourceConfig)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: BindConfig,
    pub public_url: String,
    pub mimetype: String,
    pub encoding: String,
    pub gzip_responses: bool,
    /// Supported languages; the first one is the default.
    pub languages: Vec<String>,
    pub enable_cors: bool,
    pub pretty_print_responses: bool,
    pub limit: u32,
    pub enable_admin: bool,
    pub map: Option<MapConfig>,
    pub process_manager: Option<ProcessManagerConfig>,
    pub api_rules: ApiRulesConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: BindConfig::default(),
            public_url: "http://localhost:5000".to_string(),
            mimetype: DEFAULT_MIMETYPE.to_string(),
            encoding: "utf-8".to_string(),
            gzip_responses: false,
            languages: vec!["en-US".to_string()],
            enable_cors: false,
            pretty_print_responses: false,
            limit: 10,
            enable_admin: false,
            map: None,
            process_manager: None,
            api_rules: ApiRulesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    pub host: String,
    pub port: u16,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl BindConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub url: String,
    #[serde(default)]
    pub attribution: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessManagerConfig {
    pub name: String,
    pub connection: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Python-style level name: ERROR, WARNING, INFO, DEBUG or NOTSET.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARNING".to_string(),
        }
    }
}

impl LoggingConfig {
    /// The level as a `tracing` filter directive.
    pub fn filter_directive(&self) -> &'static str {
        match self.level.to_ascii_uppercase().as_str() {
            "CRITICAL" | "ERROR" => "error",
            "WARNING" | "WARN" => "warn",
            "INFO" => "info",
            "DEBUG" => "debug",
            "NOTSET" | "TRACE" => "trace",
            other => {
                warn!(level = other, "Unknown logging level, using WARNING");
                "warn"
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub identification: IdentificationConfig,
    pub license: Option<LinkedName>,
    pub provider: Option<LinkedName>,
    pub contact: ContactConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentificationConfig {
    pub title: Localized<String>,
    pub description: Localized<String>,
    pub keywords: Localized<Vec<String>>,
    pub terms_of_service: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedName {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub name: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub hours_of_service: Option<String>,
    pub instructions: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Default,
    Hidden,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Localized<String>,
    #[serde(default)]
    pub description: Localized<String>,
    #[serde(default)]
    pub keywords: Localized<Vec<String>>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl ResourceConfig {
    pub fn is_collection(&self) -> bool {
        self.kind == "collection"
    }
}

fn ordered_resources<'de, D>(deserializer: D) -> Result<Vec<(String, ResourceConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ResourcesVisitor;

    impl<'de> Visitor<'de> for ResourcesVisitor {
        type Value = Vec<(String, ResourceConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of resource identifiers to resources")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut resources = Vec::new();
            while let Some(entry) = map.next_entry::<String, ResourceConfig>()? {
                resources.push(entry);
            }
            Ok(resources)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_map(ResourcesVisitor)
}

// ============================================================================
// Loading
// ============================================================================

impl GeoApiConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;

        debug!(path = %path.display(), "Loading configuration");
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration text, expanding `${VAR}` references.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let expanded = expand_env_vars(content)?;
        let value: Value = serde_yaml::from_str(&expanded)?;
        Self::from_value(value)
    }

    /// Build from a parsed YAML document, resolving legacy key names.
    pub fn from_value(mut value: Value) -> ConfigResult<Self> {
        if value.is_null() {
            value = Value::Mapping(Mapping::new());
        }
        apply_legacy_aliases(&mut value);

        let config: GeoApiConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        self.supported_locales()?;
        ApiRules::from_config(&self.server.api_rules)?;
        Ok(())
    }

    /// The server languages, default first.
    pub fn supported_locales(&self) -> ConfigResult<SupportedLocales> {
        Ok(SupportedLocales::new(&self.server.languages)?)
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|(k, _)| k == id).map(|(_, r)| r)
    }
}

/// Rename legacy keys to their canonical names. A canonical key that is
/// already present wins over its legacy alias.
fn apply_legacy_aliases(root: &mut Value) {
    for (section, legacy, canonical) in LEGACY_KEY_ALIASES {
        let mapping = match section_mut(root, section) {
            Some(mapping) => mapping,
            None => continue,
        };

        let legacy_key = Value::String(legacy.to_string());
        let canonical_key = Value::String(canonical.to_string());

        if let Some(value) = mapping.remove(&legacy_key) {
            if mapping.contains_key(&canonical_key) {
                warn!(
                    section = %section.join("."),
                    legacy, canonical, "Both legacy and canonical keys set, ignoring legacy key"
                );
            } else {
                mapping.insert(canonical_key, value);
            }
        }
    }
}

fn section_mut<'a>(root: &'a mut Value, path: &[&str]) -> Option<&'a mut Mapping> {
    let mut current = root;
    for key in path {
        current = current.get_mut(*key)?;
    }
    current.as_mapping_mut()
}

// ============================================================================
// Environment variable substitution
// ============================================================================

/// A `${NAME}` or `${NAME:-fallback}` reference.
#[derive(Debug, PartialEq)]
struct VarRef<'a> {
    name: &'a str,
    fallback: Option<&'a str>,
}

impl<'a> VarRef<'a> {
    /// Parse the text between `${` and `}`.
    fn parse(inner: &'a str) -> Self {
        match inner.find(":-") {
            Some(at) => Self {
                name: inner[..at].trim(),
                fallback: Some(&inner[at + 2..]),
            },
            None => Self {
                name: inner.trim(),
                fallback: None,
            },
        }
    }

    /// Set and non-empty values win over the fallback.
    fn value(&self) -> ConfigResult<String> {
        let set = std::env::var(self.name).ok().filter(|v| !v.is_empty());
        match (set, self.fallback) {
            (Some(value), _) => Ok(value),
            (None, Some(fallback)) => Ok(fallback.to_string()),
            (None, None) => std::env::var(self.name)
                .map_err(|_| ConfigError::MissingVariable(self.name.to_string())),
        }
    }
}

/// Substitute every `${...}` reference in a configuration document.
fn expand_env_vars(content: &str) -> ConfigResult<String> {
    let mut expanded = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::UnclosedVariable(after.to_string()))?;
        expanded.push_str(&VarRef::parse(&after[..end]).value()?);
        rest = &after[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}
