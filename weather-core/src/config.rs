use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_HOST: &str = "WEATHER_HOST";
pub const ENV_PORT: &str = "WEATHER_PORT";

pub const DOTENV_FILE: &str = ".env";

/// Credentials and endpoint for the OpenWeather current-weather API.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the key out of logs and panic messages.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
///
/// [server]
/// port = 8080
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub provider: Option<ProviderConfig>,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Return the provider section, or the startup error when no usable key is configured.
    pub fn provider(&self) -> Result<&ProviderConfig> {
        self.provider.as_ref().filter(|p| !p.api_key.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for OpenWeather.\n\
                 Hint: run `weather-server configure` or set {ENV_API_KEY} in the environment or {DOTENV_FILE}."
            )
        })
    }

    /// Set/replace the API key, keeping any custom endpoint or timeout.
    pub fn set_api_key(&mut self, api_key: String) {
        match self.provider.as_mut() {
            Some(provider) => provider.api_key = api_key,
            None => self.provider = Some(ProviderConfig::new(api_key)),
        }
    }

    pub fn is_provider_configured(&self) -> bool {
        self.provider().is_ok()
    }

    /// Overlay settings from the process environment, falling back to `./.env`.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with_dotenv(|name| std::env::var(name).ok(), Path::new(DOTENV_FILE))
    }

    /// Overlay settings from `process`, then from the dotenv file at `dotenv`.
    /// Process values win; a missing dotenv file is not an error.
    pub fn apply_env_with_dotenv<F>(&mut self, process: F, dotenv: &Path) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = dotenv_values(dotenv)?;
        self.apply_env_from(|name| process(name).or_else(|| file.get(name).cloned()))
    }

    /// Overlay settings from `lookup`; empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.set_api_key(key);
        }

        if let Some(url) = get(ENV_BASE_URL) {
            if let Some(provider) = self.provider.as_mut() {
                provider.base_url = url;
            }
        }

        if let Some(host) = get(ENV_HOST) {
            self.server.host = host;
        }

        if let Some(port) = get(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_PORT} value: {port}"))?;
        }

        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_file_path()?)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process environment.
fn dotenv_values(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open dotenv file: {}", path.display()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to parse dotenv file: {}", path.display()))
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn provider_errors_when_not_configured() {
        let cfg = Config::default();
        let err = cfg.provider().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains(ENV_API_KEY));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());

        assert!(!cfg.is_provider_configured());
    }

    #[test]
    fn set_api_key_keeps_custom_endpoint() {
        let mut cfg = Config::default();
        cfg.set_api_key("OLD".into());
        cfg.provider.as_mut().unwrap().base_url = "http://localhost:9000/weather".into();

        cfg.set_api_key("NEW".into());

        let provider = cfg.provider().expect("provider must exist");
        assert_eq!(provider.api_key, "NEW");
        assert_eq!(provider.base_url, "http://localhost:9000/weather");
        assert_eq!(provider.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::from_toml(
            r#"
            [provider]
            api_key = "FROM_FILE"

            [server]
            port = 8080
            "#,
        )
        .expect("valid toml");

        cfg.apply_env_from(env(&[(ENV_API_KEY, "FROM_ENV"), (ENV_HOST, "0.0.0.0")]))
            .expect("env applies");

        assert_eq!(cfg.provider().unwrap().api_key, "FROM_ENV");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn empty_env_key_does_not_configure_provider() {
        let mut cfg = Config::default();
        cfg.apply_env_from(env(&[(ENV_API_KEY, "")])).expect("env applies");

        assert!(cfg.provider().is_err());
    }

    #[test]
    fn env_base_url_applies_to_env_key() {
        let mut cfg = Config::default();
        cfg.apply_env_from(env(&[
            (ENV_API_KEY, "K"),
            (ENV_BASE_URL, "http://localhost:9000/weather"),
        ]))
        .expect("env applies");

        assert_eq!(cfg.provider().unwrap().base_url, "http://localhost:9000/weather");
    }

    #[test]
    fn env_base_url_without_key_configures_nothing() {
        let mut cfg = Config::default();
        cfg.apply_env_from(env(&[(ENV_BASE_URL, "http://localhost:9000/weather")]))
            .expect("env applies");

        assert!(cfg.provider.is_none());
    }

    #[test]
    fn dotenv_file_supplies_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        fs::write(&dotenv, "OPENWEATHER_API_KEY=from-dotenv\nWEATHER_PORT=6000\n").unwrap();

        let mut cfg = Config::default();
        cfg.apply_env_with_dotenv(env(&[]), &dotenv).expect("env applies");

        assert_eq!(cfg.provider().unwrap().api_key, "from-dotenv");
        assert_eq!(cfg.server.port, 6000);
    }

    #[test]
    fn process_env_wins_over_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        fs::write(&dotenv, "OPENWEATHER_API_KEY=from-dotenv\n").unwrap();

        let mut cfg = Config::default();
        cfg.apply_env_with_dotenv(env(&[(ENV_API_KEY, "from-process")]), &dotenv)
            .expect("env applies");

        assert_eq!(cfg.provider().unwrap().api_key, "from-process");
    }

    #[test]
    fn missing_dotenv_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();

        let mut cfg = Config::default();
        cfg.apply_env_with_dotenv(env(&[]), &dir.path().join(".env")).expect("env applies");

        assert!(!cfg.is_provider_configured());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let cfg = Config::load_or_default(&dir.path().join("config.toml")).expect("defaults");

        assert!(cfg.provider.is_none());
        assert_eq!(cfg.server.port, 5000);
    }

    #[test]
    fn malformed_config_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider\napi_key=").unwrap();

        let err = Config::load_or_default(&path).unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("Failed to parse config file"));
        assert!(msg.contains("config.toml"));
    }

    #[test]
    fn unreadable_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory exists but cannot be read as a file.
        let err = Config::load_from(dir.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SAVED".into());
        cfg.server.port = 8081;
        cfg.save_to(&path).expect("saves");

        let loaded = Config::load_from(&path).expect("loads");
        assert_eq!(loaded.provider().unwrap().api_key, "SAVED");
        assert_eq!(loaded.provider().unwrap().timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(loaded.server.port, 8081);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg.apply_env_from(env(&[(ENV_PORT, "eighty")])).unwrap_err();

        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn toml_defaults_are_filled_in() {
        let cfg = Config::from_toml("[provider]\napi_key = \"K\"\n").expect("valid toml");
        let provider = cfg.provider().unwrap();

        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.server.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let provider = ProviderConfig::new("SECRET".into());
        assert!(!format!("{provider:?}").contains("SECRET"));
    }
}
