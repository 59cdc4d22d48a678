//! Configuration management for Keepsake
//!
//! Loads settings from TOML file at ~/.keepsake/config.toml

use crate::error::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Data directory (defaults to ~/.keepsake)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".keepsake"))
        .unwrap_or_else(|| PathBuf::from(".keepsake"))
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 3333)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    /// WARNING: Setting to "0.0.0.0" exposes the server to your network.
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3333
}

fn default_host() -> String {
    "127.0.0.1".to_string() // Localhost only - secure by default
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret used to verify JWT bearer tokens.
    /// Must match the key the token issuer signs with.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write a default config file, generating a fresh random auth secret
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config = Config {
            auth: AuthConfig {
                secret: Some(uuid::Uuid::new_v4().simple().to_string()),
            },
            ..Config::default()
        };

        let content = toml::to_string_pretty(&config)
            .map_err(|e| ServiceError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the data directory, falling back to the default when unset
    pub fn data_dir(&self) -> PathBuf {
        if self.data_dir.as_os_str().is_empty() {
            default_data_dir()
        } else {
            self.data_dir.clone()
        }
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("keepsake.db")
    }

    /// Socket address the HTTP server binds to
    pub fn server_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ServiceError::Config(format!(
                    "Invalid server address {}:{}: {}",
                    self.server.host, self.server.port, e
                ))
            })
    }

    /// The JWT secret, required for serving
    pub fn auth_secret(&self) -> Result<&str> {
        self.auth
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ServiceError::Config(
                    "auth.secret is not set; run with --init or set KEEPSAKE_JWT_SECRET"
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.auth.secret.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [auth]
            secret = "top-secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth_secret().unwrap(), "top-secret");
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let config = Config::default();
        assert!(config.auth_secret().is_err());
    }

    #[test]
    fn test_create_default_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::create_default(&path).unwrap();
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.server.port, 3333);
        assert!(config.auth_secret().is_ok());
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        let addr = config.server_addr().unwrap();
        assert_eq!(addr.port(), 3333);
    }
}
