//! Configuration for the dashboard service.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Dashboard service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address (`FTE_HOST`, default 0.0.0.0).
    pub host: IpAddr,
    /// HTTP port (`FTE_PORT`, default 8000).
    pub port: u16,
    /// Vault root (`VAULT_PATH`, default ./Vault).
    pub vault_path: PathBuf,
    /// Push subscription store (`FTE_SUBSCRIPTIONS_FILE`).
    pub subscriptions_file: PathBuf,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: env::var("FTE_HOST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: env::var("FTE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            vault_path: env::var("VAULT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./Vault")),
            subscriptions_file: env::var("FTE_SUBSCRIPTIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config/push_notifications/subscriptions.json")),
            body_limit: 1024 * 1024,
        }
    }
}

impl Config {
    /// Config rooted at an explicit vault, everything else from the environment.
    #[must_use]
    pub fn with_vault(vault_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: vault_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        env::remove_var("FTE_PORT");
        env::remove_var("FTE_HOST");
        env::remove_var("VAULT_PATH");
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.vault_path, PathBuf::from("./Vault"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("FTE_PORT", "9100");
        env::set_var("FTE_HOST", "127.0.0.1");
        let config = Config::default();
        env::remove_var("FTE_PORT");
        env::remove_var("FTE_HOST");
        assert_eq!(config.addr().to_string(), "127.0.0.1:9100");
    }

    #[test]
    #[serial]
    fn test_bad_port_falls_back() {
        env::set_var("FTE_PORT", "not-a-port");
        let config = Config::default();
        env::remove_var("FTE_PORT");
        assert_eq!(config.port, 8000);
    }
}
