//! Server configuration
//!
//! Loaded from YAML (default `<config dir>/uphone/config.yaml`), then
//! overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Override { key: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    /// Origins allowed by CORS; empty allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens.
    pub token_secret: String,
    pub token_ttl_secs: u64,
    /// Serves `POST /get-access-token`, which signs a token for any uid it is
    /// given. Only for trusted deployments that front the server with their
    /// own sign-in.
    pub issue_tokens: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentsMode {
    Sandbox,
    Disabled,
}

impl std::str::FromStr for PaymentsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(PaymentsMode::Sandbox),
            "disabled" | "off" => Ok(PaymentsMode::Disabled),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub mode: PaymentsMode,
    pub currency: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            auth: AuthConfig::default(),
            payments: PaymentsConfig::default(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_secs: 60 * 60,
            issue_tokens: false,
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            mode: PaymentsMode::Sandbox,
            currency: "usd".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("uphone");
        path.push("config.yaml");
        Some(path)
    }

    /// Reads the YAML file, or falls back to defaults when it does not exist.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    warn!("no config directory on this platform, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            warn!("Config file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config: ServerConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("UPHONE_BIND") {
            self.bind = bind;
        }
        if let Some(port) = lookup("UPHONE_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Override {
                key: "UPHONE_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(secret) = lookup("ACCESS_TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        if let Some(ttl) = lookup("UPHONE_TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = ttl.trim().parse().map_err(|_| ConfigError::Override {
                key: "UPHONE_TOKEN_TTL_SECS",
                value: ttl.clone(),
            })?;
        }
        if let Some(flag) = lookup("UPHONE_ISSUE_TOKENS") {
            self.auth.issue_tokens = parse_flag(&flag).ok_or_else(|| ConfigError::Override {
                key: "UPHONE_ISSUE_TOKENS",
                value: flag.clone(),
            })?;
        }
        if let Some(mode) = lookup("UPHONE_PAYMENTS_MODE") {
            self.payments.mode = mode.parse().map_err(|value| ConfigError::Override {
                key: "UPHONE_PAYMENTS_MODE",
                value,
            })?;
        }
        Ok(())
    }

    /// Checks the settings the server refuses to start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth.token_secret (or ACCESS_TOKEN_SECRET) must be set".into(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        if self.payments.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("payments.currency must not be empty".into()));
        }
        Ok(())
    }

    /// Copy safe to print: the token secret is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.auth.token_secret.is_empty() {
            copy.auth.token_secret = "********".into();
        }
        copy
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
