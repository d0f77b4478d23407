//! Session configuration
//!
//! Ports, timeouts and TLS behaviour for directory sessions. Values come from
//! defaults, optionally overridden through environment variables; there is no
//! configuration file.

use std::time::Duration;

use crate::errors::{ADError, Result};

pub const ENV_CONNECT_TIMEOUT: &str = "ADPSO_CONNECT_TIMEOUT_SECS";
pub const ENV_OPERATION_TIMEOUT: &str = "ADPSO_OPERATION_TIMEOUT_SECS";
pub const ENV_TLS_VERIFY: &str = "ADPSO_TLS_VERIFY";

/// Directory session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Port for the plaintext attempt
    pub plain_port: u16,
    /// Port for the LDAPS fallback
    pub tls_port: u16,
    /// Socket connect timeout
    pub connect_timeout: Duration,
    /// Per-call timeout for bind, search and unbind
    pub operation_timeout: Duration,
    /// Skip TLS certificate verification (internal CAs, self-signed DC certs)
    pub skip_tls_verify: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            plain_port: 389,
            tls_port: 636,
            connect_timeout: Duration::from_secs(15),
            operation_timeout: Duration::from_secs(30),
            skip_tls_verify: true,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `ADPSO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = parse_seconds(ENV_CONNECT_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_OPERATION_TIMEOUT) {
            config.operation_timeout = parse_seconds(ENV_OPERATION_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TLS_VERIFY) {
            config.skip_tls_verify = !parse_flag(ENV_TLS_VERIFY, &raw)?;
        }

        Ok(config)
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ADError::ConfigError(format!("{} must be greater than zero", key))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ADError::ConfigError(format!(
            "{} must be a whole number of seconds, got '{}'",
            key, raw
        ))),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ADError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

/// Builder for creating SessionConfig with a fluent API
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ports(mut self, plain: u16, tls: u16) -> Self {
        self.config.plain_port = plain;
        self.config.tls_port = tls;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    pub fn skip_tls_verify(mut self, skip: bool) -> Self {
        self.config.skip_tls_verify = skip;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.plain_port, 389);
        assert_eq!(config.tls_port, 636);
        assert_eq!(config.connect_timeout, Duration::from_secs(15));
        assert!(config.skip_tls_verify);
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let config = SessionConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            (ENV_CONNECT_TIMEOUT, "5"),
            (ENV_OPERATION_TIMEOUT, "90"),
            (ENV_TLS_VERIFY, "true"),
        ]))
        .unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.operation_timeout, Duration::from_secs(90));
        assert!(!config.skip_tls_verify);
    }

    #[test]
    fn test_invalid_values() {
        let err = SessionConfig::from_lookup(lookup_from(&[(ENV_CONNECT_TIMEOUT, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ADError::ConfigError(_)));

        let err = SessionConfig::from_lookup(lookup_from(&[(ENV_OPERATION_TIMEOUT, "0")]))
            .unwrap_err();
        assert!(matches!(err, ADError::ConfigError(_)));

        let err = SessionConfig::from_lookup(lookup_from(&[(ENV_TLS_VERIFY, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ADError::ConfigError(_)));
    }

    #[test]
    fn test_builder() {
        let config = SessionConfigBuilder::new()
            .ports(3389, 3636)
            .connect_timeout(Duration::from_secs(2))
            .operation_timeout(Duration::from_secs(4))
            .skip_tls_verify(false)
            .build();
        assert_eq!(config.plain_port, 3389);
        assert_eq!(config.tls_port, 3636);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.operation_timeout, Duration::from_secs(4));
        assert!(!config.skip_tls_verify);
    }
}
