//! Endpoint configuration, loadable from TOML and overridable on the CLI.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The server address the client uses when none is configured.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Per-mount client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the WatFS server.
    pub server: String,
    /// Per-attempt RPC deadline in seconds.
    pub deadline_secs: u64,
    /// Maximum RPC attempts before an operation fails with `ETIMEDOUT`.
    pub retry_limit: u32,
    /// First retry backoff in milliseconds; doubles per attempt.
    pub backoff_start_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub backoff_cap_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER_ADDR.to_owned(),
            deadline_secs: 30,
            retry_limit: 1000,
            backoff_start_ms: 50,
            backoff_cap_ms: 1000,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        parse(&fs::read_to_string(path)?)
    }
}

/// Server configuration. The CLI's positional arguments take precedence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory to export.
    pub root: Option<PathBuf>,
    /// Listen address.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { root: None, listen: DEFAULT_SERVER_ADDR.to_owned() }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        parse(&fs::read_to_string(path)?)
    }
}

fn parse<T: DeserializeOwned>(raw: &str) -> io::Result<T> {
    toml::from_str(raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
