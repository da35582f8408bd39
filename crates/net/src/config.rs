//! Client configuration.
//!
//! Values come from the environment; bad values fall back to defaults with a
//! warning so a typo never keeps the client from starting.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::connection::ConnectOptions;
use crate::types::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_MAX_FRAME_BYTES, DEFAULT_PORT, MAX_PORT,
    MIN_PORT,
};

pub const ENV_HOST: &str = "TICTACTOE_HOST";
pub const ENV_PORT: &str = "TICTACTOE_PORT";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "TICTACTOE_CONNECT_TIMEOUT_MS";
pub const ENV_MAX_FRAME_BYTES: &str = "TICTACTOE_MAX_FRAME_BYTES";
pub const ENV_LOG_PATH: &str = "TICTACTOE_LOG_PATH";

pub const DEFAULT_LOG_PATH: &str = "tui-tictactoe.log";

/// Why a port string was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("port is empty")]
    EmptyPort,
    #[error("port {0:?} is not a number")]
    NotANumber(String),
    #[error("port {0} is outside 1024..=65535")]
    OutOfRange(u64),
}

/// Validate user-entered port text.
pub fn parse_port(text: &str) -> Result<u16, ConfigError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConfigError::EmptyPort);
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::NotANumber(text.to_string()));
    }
    // All digits; only overflow can fail here.
    let value: u64 = text.parse().unwrap_or(u64::MAX);
    if value < MIN_PORT as u64 || value > MAX_PORT as u64 {
        return Err(ConfigError::OutOfRange(value));
    }
    Ok(value as u16)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub max_frame_len: usize,
    pub log_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            max_frame_len: DEFAULT_MAX_FRAME_BYTES,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl ClientConfig {
    /// Create from `TICTACTOE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let host = var(ENV_HOST).unwrap_or(defaults.host);

        let port = match var(ENV_PORT).map(|s| parse_port(&s)) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                warn!(error = %e, default = defaults.port, "ignoring {}", ENV_PORT);
                defaults.port
            }
            None => defaults.port,
        };

        let connect_timeout = var(ENV_CONNECT_TIMEOUT_MS)
            .and_then(|s| positive(ENV_CONNECT_TIMEOUT_MS, &s))
            .map(Duration::from_millis)
            .unwrap_or(defaults.connect_timeout);

        let max_frame_len = var(ENV_MAX_FRAME_BYTES)
            .and_then(|s| positive(ENV_MAX_FRAME_BYTES, &s))
            .map(|n| n as usize)
            .unwrap_or(defaults.max_frame_len);

        let log_path = var(ENV_LOG_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.log_path);

        Self {
            host,
            port,
            connect_timeout,
            max_frame_len,
            log_path,
        }
    }

    /// Just the log file location, for setting up logging before the rest of
    /// the configuration is read.
    pub fn log_path_from_env() -> PathBuf {
        env::var(ENV_LOG_PATH)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
    }

    /// Override the port from a command-line argument.
    pub fn with_port_arg(mut self, arg: &str) -> Result<Self, ConfigError> {
        self.port = parse_port(arg)?;
        Ok(self)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.connect_timeout,
            max_frame_len: self.max_frame_len,
        }
    }
}

fn positive(key: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(value, "ignoring {}", key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_port_bounds() {
        assert_eq!(parse_port("1024"), Ok(1024));
        assert_eq!(parse_port(" 65535 "), Ok(65535));
        assert_eq!(parse_port("1023"), Err(ConfigError::OutOfRange(1023)));
        assert_eq!(parse_port("65536"), Err(ConfigError::OutOfRange(65536)));
    }

    #[test]
    fn test_parse_port_rejects_junk() {
        assert_eq!(parse_port(""), Err(ConfigError::EmptyPort));
        assert_eq!(parse_port("   "), Err(ConfigError::EmptyPort));
        assert_eq!(parse_port("-1"), Err(ConfigError::NotANumber("-1".into())));
        assert_eq!(parse_port("99a"), Err(ConfigError::NotANumber("99a".into())));
        assert!(matches!(
            parse_port("99999999999999999999999"),
            Err(ConfigError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(ClientConfig::from_lookup(lookup(&[])), ClientConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_HOST, "10.0.0.2"),
            (ENV_PORT, "7777"),
            (ENV_CONNECT_TIMEOUT_MS, "250"),
            (ENV_MAX_FRAME_BYTES, "1024"),
            (ENV_LOG_PATH, "/tmp/ttt.log"),
        ]));
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 7777);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.max_frame_len, 1024);
        assert_eq!(config.log_path, PathBuf::from("/tmp/ttt.log"));
    }

    #[test]
    fn test_invalid_environment_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_PORT, "80"),
            (ENV_CONNECT_TIMEOUT_MS, "0"),
            (ENV_MAX_FRAME_BYTES, "lots"),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.connect_timeout, ClientConfig::default().connect_timeout);
        assert_eq!(config.max_frame_len, DEFAULT_MAX_FRAME_BYTES);
    }

    #[test]
    fn test_port_arg_overrides_and_validates() {
        let config = ClientConfig::default().with_port_arg("4000").unwrap();
        assert_eq!(config.port, 4000);
        assert!(ClientConfig::default().with_port_arg("12").is_err());
    }
}
