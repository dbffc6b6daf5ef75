use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::retry::RetryPolicy;

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const GEOCODING_URL_ENV: &str = "GEOCODING_URL";
pub const WEATHER_URL_ENV: &str = "OPENWEATHER_URL";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// geocoding_url = "http://api.openweathermap.org/geo/1.0/direct?q={City}&limit=5&appid={APIkey}"
///
/// [retry]
/// max_attempts = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Shared key for the geocoding and weather APIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Template with `{City}` and `{APIkey}` placeholders.
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Template with `{lat}`, `{lon}` and `{APIkey}` placeholders.
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_geocoding_url() -> String {
    "http://api.openweathermap.org/geo/1.0/direct?q={City}&limit=5&appid={APIkey}".to_string()
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather?lat={lat}&lon={lon}&appid={APIkey}"
        .to_string()
}

const fn default_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            timeout_secs: default_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from disk only, or return an empty default if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay non-empty values from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = var(GEOCODING_URL_ENV) {
            self.geocoding_url = url;
        }
        if let Some(url) = var(WEATHER_URL_ENV) {
            self.weather_url = url;
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check everything a lookup needs before any request goes out.
    pub fn validate(&self) -> Result<()> {
        if self.api_key().is_none() {
            bail!(
                "No API key configured.\n\
                 Hint: run `cityweather configure` or set {API_KEY_ENV}."
            );
        }

        require_placeholders(
            "geocoding_url",
            &self.geocoding_url,
            &["{City}", "{APIkey}"],
        )?;
        require_placeholders(
            "weather_url",
            &self.weather_url,
            &["{lat}", "{lon}", "{APIkey}"],
        )?;

        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

fn require_placeholders(field: &str, template: &str, placeholders: &[&str]) -> Result<()> {
    let missing: Vec<&str> = placeholders
        .iter()
        .copied()
        .filter(|p| !template.contains(p))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        bail!("{field} is missing placeholder(s): {}", missing.join(", "))
    }
}
