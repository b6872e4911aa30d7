//! Server configuration.
//!
//! Values come from built-in defaults, then an optional YAML file, then the
//! `LISTEN` and `DIRECTORY` environment variables. Command-line flags are
//! applied on top by the binary.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::connection::ConnectionSettings;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "COURIER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Seconds; 0 disables the deadline
    pub read_timeout_secs: u64,
    /// Seconds; 0 disables the deadline
    pub write_timeout_secs: u64,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    /// Close the connection after answering an unmatched route
    pub close_on_not_found: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = ConnectionSettings::default();
        Self {
            listen_addr: "0.0.0.0:4221".to_string(),
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            max_header_bytes: limits.max_header_bytes,
            max_body_bytes: limits.max_body_bytes,
            close_on_not_found: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory served under `/files/`
    pub directory: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// `path` (or the file named by `COURIER_CONFIG`) is parsed as YAML when
    /// given; environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut cfg = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }
        if let Some(directory) = std::env::var_os("DIRECTORY") {
            cfg.files.directory = PathBuf::from(directory);
        }

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

impl ServerConfig {
    /// Limits and deadlines handed to every connection.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_timeout: secs(self.read_timeout_secs),
            write_timeout: secs(self.write_timeout_secs),
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}
