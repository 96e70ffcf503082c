use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_ENV: &str = "VETTER_CONFIG_DIR";
pub const SERVER_ENV: &str = "VETTER_SERVER";
pub const FORMAT_ENV: &str = "VETTER_FORMAT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub queue: Option<String>,
}

/// `<config dir>/vetter`, or `$VETTER_CONFIG_DIR` when set.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|dir| dir.join("vetter"))
}

/// Load `config.toml` from `dir`. A missing file yields defaults.
pub fn load_config_from(dir: &Path) -> Result<Config> {
    let path = dir.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_config() -> Result<Config> {
    let Some(dir) = config_dir() else {
        return Ok(Config::default());
    };
    load_config_from(&dir)
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub config: Config,
    pub base_url: String,
    pub resolved_output: String,
}

/// Layer CLI flags and environment over the config file.
pub fn resolve_config(cli_server: Option<&str>, cli_json: bool) -> Result<EffectiveConfig> {
    let config = load_config()?;
    let base_url = resolve_base_url(
        cli_server,
        env::var(SERVER_ENV).ok(),
        &config.server.base_url,
    );
    let resolved_output = resolve_output(
        cli_json,
        config.output.clone(),
        env::var(FORMAT_ENV).ok(),
        std::io::stdout().is_terminal(),
    );
    Ok(EffectiveConfig {
        config,
        base_url,
        resolved_output,
    })
}

fn resolve_base_url(cli: Option<&str>, env_server: Option<String>, file: &str) -> String {
    cli.map(str::to_string)
        .or(env_server)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| file.to_string())
}

fn resolve_output(
    cli_json: bool,
    config_output: Option<String>,
    env_format: Option<String>,
    is_terminal: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = config_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if is_terminal { "pretty" } else { "text" }.to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_search_limit() -> usize {
    80
}

const fn default_debounce_ms() -> u64 {
    200
}
