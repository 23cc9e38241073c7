//! Configuration management.
//!
//! Connection settings are resolved per field with this priority:
//! 1. Command-line flag or its `CONFLUENCE_*` environment variable
//! 2. Config file (`--config <FILE>`, else `~/.confluence-sync/config.json`)
//! 3. Built-in default (only `base_path`, which defaults to `/wiki/`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_BASE_PATH: &str = "/wiki/";

/// Settings read from the JSON config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigFile {
    pub domain: Option<String>,
    pub base_path: Option<String>,
    pub space_key: Option<String>,
    pub user_name: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub root_page_id: Option<String>,
}

/// Values given on the command line (or through the environment).
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub domain: Option<String>,
    pub base_path: Option<String>,
    pub space_key: Option<String>,
    pub user_name: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProperties {
    /// Host name, e.g. `example.atlassian.net`
    pub domain: String,
    /// Always starts and ends with `/`
    pub base_path: String,
    /// Default space for new pages and markers without a space key
    pub space_key: String,
    /// Enables basic auth when set; bearer token auth otherwise
    pub user_name: Option<String>,
    pub api_key: String,
    /// Overrides `https://{domain}{base_path}rest/api/`
    pub api_url: Option<String>,
}

impl ConnectionProperties {
    /// Merge command-line overrides with the config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the domain, space key or API key is missing.
    pub fn resolve(overrides: ConnectionOverrides, file: &ConfigFile) -> Result<Self> {
        let pick = |flag: Option<String>, stored: &Option<String>| {
            non_empty(flag).or_else(|| non_empty(stored.clone()))
        };

        let domain = pick(overrides.domain, &file.domain)
            .ok_or_else(|| Error::Config("Confluence domain not specified".into()))?;
        let space_key = pick(overrides.space_key, &file.space_key)
            .ok_or_else(|| Error::Config("Confluence space key not specified".into()))?;
        let api_key = pick(overrides.api_key, &file.api_key)
            .ok_or_else(|| Error::Config("Confluence API key not specified".into()))?;
        let base_path = pick(overrides.base_path, &file.base_path)
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());

        Ok(Self {
            domain,
            base_path: normalize_base_path(&base_path),
            space_key,
            user_name: pick(overrides.user_name, &file.user_name),
            api_key,
            api_url: pick(overrides.api_url, &file.api_url),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Ensure a base path starts and ends with a slash.
#[must_use]
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Get the default config file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".confluence-sync").join("config.json"))
}

/// Load the config file.
///
/// An explicit path must exist. The default location is optional and
/// yields an empty config when absent.
///
/// # Errors
///
/// Returns `Error::Config` if the file cannot be read or parsed.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ConfigFile::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> ConnectionOverrides {
        ConnectionOverrides {
            domain: Some("example.atlassian.net".into()),
            space_key: Some("DOCS".into()),
            api_key: Some("secret".into()),
            ..ConnectionOverrides::default()
        }
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("wiki"), "/wiki/");
        assert_eq!(normalize_base_path("/wiki"), "/wiki/");
        assert_eq!(normalize_base_path("/wiki/"), "/wiki/");
        assert_eq!(normalize_base_path(""), "/");
        assert_eq!(normalize_base_path("/"), "/");
    }

    #[test]
    fn test_resolve_defaults_base_path() {
        let props = ConnectionProperties::resolve(overrides(), &ConfigFile::default()).unwrap();
        assert_eq!(props.base_path, "/wiki/");
        assert_eq!(props.space_key, "DOCS");
        assert!(props.user_name.is_none());
    }

    #[test]
    fn test_flags_take_priority_over_file() {
        let file = ConfigFile {
            domain: Some("other.example.com".into()),
            base_path: Some("confluence".into()),
            user_name: Some("bot@example.com".into()),
            ..ConfigFile::default()
        };

        let props = ConnectionProperties::resolve(overrides(), &file).unwrap();
        assert_eq!(props.domain, "example.atlassian.net");
        assert_eq!(props.base_path, "/confluence/");
        assert_eq!(props.user_name.as_deref(), Some("bot@example.com"));
    }

    #[test]
    fn test_empty_flag_falls_back_to_file() {
        let mut flags = overrides();
        flags.domain = Some("  ".into());
        let file = ConfigFile {
            domain: Some("file.example.com".into()),
            ..ConfigFile::default()
        };

        let props = ConnectionProperties::resolve(flags, &file).unwrap();
        assert_eq!(props.domain, "file.example.com");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let mut flags = overrides();
        flags.api_key = None;

        let err = ConnectionProperties::resolve(flags, &ConfigFile::default()).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("API key")));
    }

    #[test]
    fn test_load_explicit_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"domain": "example.atlassian.net", "space_key": "DOCS", "root_page_id": "42"}"#,
        )
        .unwrap();

        let file = load_config(Some(&path)).unwrap();
        assert_eq!(file.domain.as_deref(), Some("example.atlassian.net"));
        assert_eq!(file.root_page_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let err = load_config(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_default_config_path_location() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(".confluence-sync/config.json"));
    }
}
