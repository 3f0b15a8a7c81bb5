//! Settings shared by every strategy, loaded from TOML.
//!
//! ```toml
//! text_time_budget_ms = 2000
//! insert_color = "#d4fcbc"
//!
//! [pagefreezer]
//! api_key = "..."
//! ```
//!
//! Missing keys take their defaults. `PAGEFREEZER_API_KEY` and
//! `PAGEFREEZER_URL` override the `[pagefreezer]` table.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use net::PageFreezerConfig;

pub const ENV_API_KEY: &str = "PAGEFREEZER_API_KEY";
pub const ENV_ENDPOINT: &str = "PAGEFREEZER_URL";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Engine budget for the visible-text diff.
    pub text_time_budget_ms: u64,
    /// Engine budget for the raw source diff.
    pub source_time_budget_ms: u64,
    /// Token alignment budget for the structural diffs.
    pub markup_time_budget_ms: u64,
    /// Background of inserted content in rendered diffs.
    pub insert_color: String,
    pub delete_color: String,
    /// Indent rendered documents one tag per line.
    pub pretty_output: bool,
    pub pagefreezer: PageFreezerConfig,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            text_time_budget_ms: 2000,
            source_time_budget_ms: 2000,
            markup_time_budget_ms: 2000,
            insert_color: "#d4fcbc".to_string(),
            delete_color: "#fbb6c2".to_string(),
            pretty_output: true,
            pagefreezer: PageFreezerConfig::default(),
        }
    }
}

impl DiffConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DiffConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(target: "differs.config", "loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies `PAGEFREEZER_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            log::debug!(target: "differs.config", "api key taken from {ENV_API_KEY}");
            self.pagefreezer.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            log::debug!(target: "differs.config", "endpoint taken from {ENV_ENDPOINT}: {url}");
            self.pagefreezer.endpoint = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_zero(self.text_time_budget_ms, "text_time_budget_ms")?;
        ensure_non_zero(self.source_time_budget_ms, "source_time_budget_ms")?;
        ensure_non_zero(self.markup_time_budget_ms, "markup_time_budget_ms")?;
        ensure_non_zero(self.pagefreezer.timeout_secs, "pagefreezer.timeout_secs")?;
        ensure_color(&self.insert_color, "insert_color")?;
        ensure_color(&self.delete_color, "delete_color")?;
        if self.pagefreezer.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation(
                "pagefreezer.endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn text_budget(&self) -> Duration {
        Duration::from_millis(self.text_time_budget_ms)
    }

    pub fn source_budget(&self) -> Duration {
        Duration::from_millis(self.source_time_budget_ms)
    }

    pub fn markup_budget(&self) -> Duration {
        Duration::from_millis(self.markup_time_budget_ms)
    }
}

fn ensure_non_zero(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}

fn ensure_color(value: &str, field: &str) -> Result<(), ConfigError> {
    // Colors end up inside a stylesheet; anything that could close the rule
    // or the style element is refused.
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} must not be empty")));
    }
    if value.contains(['{', '}', ';', '<', '>']) {
        return Err(ConfigError::Validation(format!(
            "{field} is not a css color: {value:?}"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error reading config: {e}"),
            ConfigError::Parse(e) => write!(f, "TOML parse error in config: {e}"),
            ConfigError::Validation(msg) => write!(f, "Config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}
