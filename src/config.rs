use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::language::Language;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_WEB_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub web_base_url: String,
    pub auth_token: Option<String>,
    pub default_language: Language,
    pub tick_ms: u64,
    pub request_timeout_secs: u64,
    pub notification_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            web_base_url: DEFAULT_WEB_URL.to_string(),
            auth_token: None,
            default_language: Language::JavaScript,
            tick_ms: 1000,
            request_timeout_secs: 15,
            notification_secs: 5,
        }
    }
}

/// Values given on the command line; `None` keeps whatever the config file says
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub web_base_url: Option<String>,
    pub auth_token: Option<String>,
    pub default_language: Option<Language>,
    pub tick_ms: Option<u64>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.api_base_url {
            self.api_base_url = url;
        }
        if let Some(url) = overrides.web_base_url {
            self.web_base_url = url;
        }
        if let Some(token) = overrides.auth_token {
            self.auth_token = Some(token);
        }
        if let Some(language) = overrides.default_language {
            self.default_language = language;
        }
        if let Some(ms) = overrides.tick_ms {
            self.tick_ms = ms;
        }
        self
    }

    /// Interval between countdown recomputations, never below 50ms
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(50))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn problem_url(&self, slug_or_id: &str) -> String {
        format!(
            "{}/problems/{}",
            self.web_base_url.trim_end_matches('/'),
            slug_or_id
        )
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mockprep_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
