use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::time::Duration;

fn default_max_file_size() -> usize {
    // 50 MB in bytes
    50 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("PREVIEW_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid PREVIEW_BIND_ADDR: {}", addr))?;
        }
        if let Some(size) = lookup("PREVIEW_MAX_FILE_SIZE") {
            config.max_file_size = size
                .parse()
                .with_context(|| format!("Invalid PREVIEW_MAX_FILE_SIZE: {}", size))?;
        }
        if let Some(secs) = lookup("PREVIEW_FETCH_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid PREVIEW_FETCH_TIMEOUT_SECS: {}", secs))?;
            config.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    Config::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, default_bind_addr());
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_are_parsed() {
        let env: HashMap<&str, &str> = [
            ("PREVIEW_BIND_ADDR", "0.0.0.0:8080"),
            ("PREVIEW_MAX_FILE_SIZE", "1024"),
            ("PREVIEW_FETCH_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_size_is_rejected() {
        let result = Config::from_lookup(|k| (k == "PREVIEW_MAX_FILE_SIZE").then(|| "lots".to_string()));
        assert!(result.is_err());
    }
}
