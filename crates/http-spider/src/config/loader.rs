use std::path::Path;

use crate::config::schema::SpiderConfig;
use crate::error::ConfigError;

/// Upper bound accepted for `max_redirects`.
const MAX_REDIRECT_LIMIT: usize = 20;

pub const ENV_STORAGE_PATH: &str = "SPIDER_STORAGE_PATH";
pub const ENV_DEBUG: &str = "SPIDER_DEBUG";
pub const ENV_MAX_REDIRECTS: &str = "SPIDER_MAX_REDIRECTS";
pub const ENV_USER_AGENT: &str = "SPIDER_USER_AGENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SpiderConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, format)
}

pub fn load_config_from_str(
    content: &str,
    format: ConfigFormat,
) -> Result<SpiderConfig, ConfigError> {
    let config: SpiderConfig = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_config(&config)?;

    Ok(config)
}

impl SpiderConfig {
    /// Builds a config from defaults overridden by `SPIDER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = SpiderConfig::default();

        if let Some(path) = read_env(ENV_STORAGE_PATH) {
            config.storage_path = path.into();
        }
        if let Some(value) = read_env(ENV_DEBUG) {
            config.debug = parse_bool(ENV_DEBUG, &value)?;
        }
        if let Some(value) = read_env(ENV_MAX_REDIRECTS) {
            config.max_redirects = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_MAX_REDIRECTS.to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(agent) = read_env(ENV_USER_AGENT) {
            config.user_agent = Some(agent);
        }

        validate_config(&config)?;
        Ok(config)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn validate_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    if config.storage_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage_path must not be empty".to_string(),
        });
    }

    if config.max_redirects > MAX_REDIRECT_LIMIT {
        return Err(ConfigError::Validation {
            message: format!(
                "max_redirects must be at most {}, got {}",
                MAX_REDIRECT_LIMIT, config.max_redirects
            ),
        });
    }

    Ok(())
}
