use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::url::resolve_gist_id;

pub const DEFAULT_WAKATIME_BASE_URL: &str = "https://wakatime.com/api/v1/users";
pub const DEFAULT_GISTS_URL: &str = "https://api.github.com/gists";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Keys understood by `wakalog config get|set`.
pub const CONFIG_KEYS: &[&str] = &["gist_id"];

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub wakatime_user: String,
    pub wakatime_api_key: String,
    pub wakatime_base_url: String,
    pub github_username: String,
    pub github_password: String,
    pub gists_url: String,
    /// Existing storage location. `None` makes the first sync create one.
    pub gist_id: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup. Every missing
    /// required variable is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        let mut require = |key: &str| {
            get(key).unwrap_or_else(|| {
                missing.push(key.to_string());
                String::new()
            })
        };
        let wakatime_user = require("WAKATIME_USERNAME");
        let wakatime_api_key = require("WAKATIME_API_KEY");
        let github_username = require("GITHUB_USERNAME");
        let github_password = require("GITHUB_PASSWORD");
        if !missing.is_empty() {
            return Err(Error::ConfigMissing(missing));
        }

        let gist_id = get("GIST_ID").map(|id| resolve_gist_id(&id)).transpose()?;

        let http_timeout = match get("WAKALOG_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Config(format!(
                        "WAKALOG_HTTP_TIMEOUT_SECS must be a positive whole number, got '{raw}'"
                    )))
                }
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            wakatime_user,
            wakatime_api_key,
            wakatime_base_url: get("WAKATIME_BASE_URL")
                .unwrap_or_else(|| DEFAULT_WAKATIME_BASE_URL.to_string()),
            github_username,
            github_password,
            gists_url: get("GITHUB_GISTS_URL").unwrap_or_else(|| DEFAULT_GISTS_URL.to_string()),
            gist_id,
            http_timeout,
        })
    }

    /// Fill in the storage location from the config file unless one was
    /// already supplied through the environment.
    pub fn with_config_file(mut self, file: &ConfigFile) -> Self {
        if self.gist_id.is_none() {
            self.gist_id = file.gist_id.clone();
        }
        self
    }
}

/// The on-disk settings that survive between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gist_id: Option<String>,
}

impl ConfigFile {
    /// Default location: `~/.wakalog/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
            .join(".wakalog")
            .join("config.json"))
    }

    /// Load the file, treating a missing file as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Ok(Self::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::Config(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match key {
            "gist_id" => Ok(self.gist_id.clone()),
            other => Err(unknown_key(other)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "gist_id" => {
                self.gist_id = Some(resolve_gist_id(value)?);
                Ok(())
            }
            other => Err(unknown_key(other)),
        }
    }

    pub fn list(&self) -> Vec<(String, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| {
                self.get(key)
                    .ok()
                    .flatten()
                    .map(|value| (key.to_string(), value))
            })
            .collect()
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown config key '{key}' (known keys: {})",
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("WAKATIME_USERNAME", "octo"),
            ("WAKATIME_API_KEY", "waka_123"),
            ("GITHUB_USERNAME", "octocat"),
            ("GITHUB_PASSWORD", "ghp_secret"),
        ]
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(env(&full_env())).unwrap();
        assert_eq!(config.wakatime_user, "octo");
        assert_eq!(config.github_password, "ghp_secret");
        assert_eq!(config.wakatime_base_url, DEFAULT_WAKATIME_BASE_URL);
        assert_eq!(config.gists_url, DEFAULT_GISTS_URL);
        assert_eq!(config.gist_id, None);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_variables_reported_together() {
        let err = Config::from_lookup(env(&[("WAKATIME_USERNAME", "octo"), ("GITHUB_PASSWORD", " ")]))
            .unwrap_err();
        match err {
            Error::ConfigMissing(keys) => assert_eq!(
                keys,
                vec!["WAKATIME_API_KEY", "GITHUB_USERNAME", "GITHUB_PASSWORD"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gist_id_from_env_accepts_url() {
        let mut vars = full_env();
        vars.push(("GIST_ID", "https://gist.github.com/octocat/abc123"));
        let config = Config::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.gist_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bad_timeout() {
        let mut vars = full_env();
        vars.push(("WAKALOG_HTTP_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            Config::from_lookup(env(&vars)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut vars = full_env();
        vars.push(("WAKALOG_HTTP_TIMEOUT_SECS", "0"));
        assert!(matches!(
            Config::from_lookup(env(&vars)),
            Err(Error::Config(_))
        ));

        let mut vars = full_env();
        vars.push(("WAKALOG_HTTP_TIMEOUT_SECS", "5"));
        let config = Config::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_gist_id_wins_over_file() {
        let mut vars = full_env();
        vars.push(("GIST_ID", "abc123"));
        let file = ConfigFile {
            gist_id: Some("def456".into()),
        };
        let config = Config::from_lookup(env(&vars)).unwrap().with_config_file(&file);
        assert_eq!(config.gist_id.as_deref(), Some("abc123"));

        let config = Config::from_lookup(env(&full_env()))
            .unwrap()
            .with_config_file(&file);
        assert_eq!(config.gist_id.as_deref(), Some("def456"));
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(ConfigFile::load(&path).unwrap(), ConfigFile::default());

        let mut file = ConfigFile::default();
        file.set("gist_id", "https://api.github.com/gists/abc123").unwrap();
        file.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.get("gist_id").unwrap().as_deref(), Some("abc123"));
        assert_eq!(loaded.list(), vec![("gist_id".to_string(), "abc123".to_string())]);
    }

    #[test]
    fn test_config_file_unknown_key() {
        let mut file = ConfigFile::default();
        assert!(file.set("colour", "blue").is_err());
        assert!(file.get("colour").is_err());
        assert!(file.list().is_empty());
    }
}
