use adw::Application;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const API_URL_ENV: &str = "SERVIFLEX_API_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config encode: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    // TOML is the current format; an older JSON file is converted on first load.
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("serviflex.toml"))
    }

    fn legacy_json_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("br", "serviflex", "ServiFlex")?;
        Some(proj.config_dir().join("config.json"))
    }

    /// Loads the user config, falling back to defaults. `SERVIFLEX_API_URL`
    /// wins over the file.
    pub fn load() -> Self {
        let env_url = std::env::var(API_URL_ENV).ok();
        match (Self::toml_path(), Self::legacy_json_path()) {
            (Some(toml), Some(legacy)) => Self::load_with(&toml, &legacy, env_url),
            (Some(toml), None) => Self::load_with(&toml, Path::new(""), env_url),
            _ => Self::default().with_url_override(env_url),
        }
    }

    /// Reads `toml`, migrating `legacy` into it when only the JSON file exists.
    pub fn load_with(toml: &Path, legacy: &Path, env_url: Option<String>) -> Self {
        Self::load_from(toml)
            .or_else(|| {
                let bytes = fs::read(legacy).ok()?;
                let config = serde_json::from_slice::<AppConfig>(&bytes).ok()?;
                log::info!("migrating legacy config {}", legacy.display());
                if let Err(e) = config.save_to(toml) {
                    log::warn!("could not write migrated config: {e}");
                }
                Some(config)
            })
            .unwrap_or_default()
            .with_url_override(env_url)
    }

    fn with_url_override(mut self, env_url: Option<String>) -> Self {
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self.api_url = crate::utils::normalize_url(&self.api_url);
        self
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        match toml::from_str::<AppConfig>(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {e}", path.display());
                None
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn build_ui(app: &Application) {
    let config = AppConfig::load();
    log::info!("using ServiFlex API at {}", config.api_url);
    crate::ui::main_window::show_main_window(app, config);
}
