//! Service configuration from environment variables

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const ENV_STORE_PATH: &str = "FOODRANK_STORE_PATH";
pub const ENV_HOST: &str = "FOODRANK_HOST";
pub const ENV_PORT: &str = "FOODRANK_PORT";
pub const ENV_PORT_ATTEMPTS: &str = "FOODRANK_PORT_ATTEMPTS";

pub const DEFAULT_STORE_PATH: &str = "data/raw/food_popularity_data.jsonl";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PORT_ATTEMPTS: u16 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub store_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Successive ports tried when `port` is taken
    pub port_attempts: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup(ENV_PORT) {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, v))?,
            None => defaults.port,
        };

        let port_attempts = match lookup(ENV_PORT_ATTEMPTS) {
            Some(v) => v.trim().parse::<u16>().with_context(|| {
                format!("{} must be a positive integer, got '{}'", ENV_PORT_ATTEMPTS, v)
            })?,
            None => defaults.port_attempts,
        };
        if port_attempts == 0 {
            anyhow::bail!("{} must be at least 1", ENV_PORT_ATTEMPTS);
        }

        Ok(Self {
            store_path: lookup(ENV_STORE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            host: lookup(ENV_HOST).unwrap_or(defaults.host),
            port,
            port_attempts,
        })
    }
}
