use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV_PREFIX: &str = "MARGINALIA";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    crate::api::DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    "marginalia/0.1 (+https://github.com/marginalia-dev/marginalia)".to_string()
}

fn default_timeout() -> Duration {
    crate::api::DEFAULT_TIMEOUT
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    #[serde(default = "default_highlight_commented")]
    pub highlight_commented: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            highlight_commented: default_highlight_commented(),
        }
    }
}

fn default_highlight_commented() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    if let Some(from_env) = load_env(prefix)? {
        cfg = merge_config(cfg, from_env);
    }

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.remote.base_url.is_empty() {
        base.remote.base_url = other.remote.base_url;
    }
    if !other.remote.user_agent.is_empty() {
        base.remote.user_agent = other.remote.user_agent;
    }
    base.remote.timeout = other.remote.timeout;

    base.ui.highlight_commented = other.ui.highlight_commented;

    base
}

fn load_env(prefix: &str) -> Result<Option<Config>> {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    if map.is_empty() {
        return Ok(None);
    }

    let mut cfg = Config::default();

    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value);
    }

    Ok(Some(cfg))
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "remote.base_url" => cfg.remote.base_url = value,
        "remote.user_agent" => cfg.remote.user_agent = value,
        "remote.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.remote.timeout = duration;
            }
        }
        "ui.highlight_commented" => {
            cfg.ui.highlight_commented = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("marginalia").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[test]
    fn load_defaults_without_files() {
        let cfg = load(LoadOptions {
            env_prefix: Some("MARGINALIA_TEST_NONE".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.remote.base_url, default_base_url());
        assert!(cfg.ui.highlight_commented);
        assert_eq!(cfg.remote.timeout, default_timeout());
    }

    #[test]
    fn load_reads_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "remote:\n  base_url: https://docs.example.com/api/comments/\nui:\n  highlight_commented: false\n",
        )
        .unwrap();
        let cfg = load(LoadOptions {
            config_file: Some(path),
            env_prefix: Some("MARGINALIA_TEST_NONE".into()),
        })
        .unwrap();
        assert_eq!(cfg.remote.base_url, "https://docs.example.com/api/comments/");
        assert!(!cfg.ui.highlight_commented);
    }

    #[test]
    fn env_overrides() {
        env::set_var("MARGINALIA_REMOTE__USER_AGENT", "docs-bot/2.0");
        let cfg = load(LoadOptions::default()).unwrap();
        assert_eq!(cfg.remote.user_agent, "docs-bot/2.0");
        env::remove_var("MARGINALIA_REMOTE__USER_AGENT");
    }
}
