//! Server configuration: TOML file + CLI overrides.

use couchpad_core::{RelayError, RelayResult};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level config file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address to listen on. Behind a reverse proxy this should be
    /// `127.0.0.1` so the relay is only reachable through the proxy.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    10101
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// Resolved server configuration (CLI overrides applied, bind parsed).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: IpAddr,
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    pub fn load(
        config_path: Option<&Path>,
        cli_port: Option<u16>,
        cli_bind: Option<&str>,
    ) -> RelayResult<Self> {
        // Load base config from file
        let file_config = if let Some(path) = config_path {
            let expanded = expand_tilde(path);
            if expanded.exists() {
                info!(path = %expanded.display(), "loading config file");
                let content = std::fs::read_to_string(&expanded)?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| RelayError::Config(format!("config parse error: {e}")))?
            } else {
                info!(path = %expanded.display(), "config file not found, using defaults");
                ConfigFile {
                    server: ServerSection::default(),
                }
            }
        } else {
            ConfigFile {
                server: ServerSection::default(),
            }
        };

        // Merge CLI overrides
        let port = cli_port.unwrap_or(file_config.server.port);
        let bind_str = cli_bind
            .map(|s| s.to_string())
            .unwrap_or(file_config.server.bind);
        let bind = bind_str
            .parse::<IpAddr>()
            .map_err(|e| RelayError::Config(format!("invalid bind address {bind_str:?}: {e}")))?;

        Ok(Self { port, bind })
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(s.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let cfg = ServerConfig::load(None, None, None).unwrap();
        assert_eq!(cfg.port, 10101);
        assert_eq!(cfg.bind, "0.0.0.0".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn cli_overrides_win() {
        let cfg = ServerConfig::load(None, Some(0), Some("127.0.0.1")).unwrap();
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.bind, "127.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn bad_bind_address_is_a_config_error() {
        let err = ServerConfig::load(None, None, Some("not-an-address")).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
