//! Configuration management for CarbonLedger

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{LedgerError, Result};
use crate::miner::{ProofOfWork, DEFAULT_DIFFICULTY, MAX_DIFFICULTY};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Leading hex zeros a proof digest must carry.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Optional ceiling on candidates tried per seal.
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_attempts: None,
        }
    }
}

impl LedgerConfig {
    pub fn proof_of_work(&self) -> ProofOfWork {
        let pow = ProofOfWork::new(self.difficulty);
        match self.max_attempts {
            Some(limit) => pow.with_max_attempts(limit),
            None => pow,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<Config> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Load and validate a config file. A missing file yields the defaults; the
/// `PORT` environment variable overrides `api.port`.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        parse_config(&fs::read_to_string(path)?)?
    } else {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        Config::default()
    };

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        config.api.port = port;
    }

    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.ledger.difficulty == 0 || self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::ConfigError(format!(
                "ledger.difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, self.ledger.difficulty
            )));
        }
        if self.ledger.max_attempts == Some(0) {
            return Err(LedgerError::ConfigError(
                "ledger.max_attempts must be greater than 0 when set".to_string(),
            ));
        }
        if self.api.host.is_empty() {
            return Err(LedgerError::ConfigError("api.host must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
