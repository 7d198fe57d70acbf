//! Client configuration.

use std::fmt;
use std::path::PathBuf;

use crate::error::{ClientError, ClientResult};
use crate::key::PrivateKey;

/// Where the signing key comes from.
#[derive(Clone)]
pub enum KeySource {
    /// PEM text held in memory.
    Pem(String),

    /// Path to a PEM file.
    File(PathBuf),

    /// An already-parsed key.
    Key(PrivateKey),
}

impl KeySource {
    pub(crate) fn resolve(&self) -> ClientResult<PrivateKey> {
        match self {
            Self::Pem(pem) => PrivateKey::from_pem(pem),
            Self::File(path) => PrivateKey::from_pem_file(path),
            Self::Key(key) => Ok(key.clone()),
        }
    }
}

// PEM text is key material; keep it out of Debug output.
impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pem(_) => f.write_str("KeySource::Pem(..)"),
            Self::File(path) => f.debug_tuple("KeySource::File").field(path).finish(),
            Self::Key(_) => f.write_str("KeySource::Key(..)"),
        }
    }
}

/// Connection configuration for a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server, e.g. `https://pantry.example.com`.
    pub url: String,

    /// Client name the server authenticates.
    pub client_name: String,

    /// Signing key source.
    pub key: Option<KeySource>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    120
}

impl ServerConfig {
    /// Create a configuration for the given server and client name.
    pub fn new(url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: client_name.into(),
            key: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `PANTRY_SERVER_URL` | Server base URL |
    /// | `PANTRY_CLIENT_NAME` | Client name |
    /// | `PANTRY_CLIENT_KEY` | Path to the PEM private key |
    /// | `PANTRY_TIMEOUT` | Request timeout in seconds (default: 120) |
    pub fn from_env() -> ClientResult<Self> {
        let url = std::env::var("PANTRY_SERVER_URL").map_err(|_| ClientError::Config {
            message: "PANTRY_SERVER_URL not set".into(),
        })?;
        let client_name = std::env::var("PANTRY_CLIENT_NAME").map_err(|_| ClientError::Config {
            message: "PANTRY_CLIENT_NAME not set".into(),
        })?;

        let mut config = Self::new(url, client_name);
        if let Ok(path) = std::env::var("PANTRY_CLIENT_KEY") {
            config.key = Some(KeySource::File(path.into()));
        }
        if let Some(timeout) = std::env::var("PANTRY_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }

    /// Supply the key as PEM text.
    pub fn with_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.key = Some(KeySource::Pem(pem.into()));
        self
    }

    /// Supply the key as a PEM file path.
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key = Some(KeySource::File(path.into()));
        self
    }

    /// Supply an already-parsed key.
    pub fn with_key(mut self, key: PrivateKey) -> Self {
        self.key = Some(KeySource::Key(key));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub(crate) fn resolve_key(&self) -> ClientResult<PrivateKey> {
        self.key
            .as_ref()
            .ok_or_else(|| ClientError::Config {
                message: "no private key configured".into(),
            })?
            .resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKCS8: &str = include_str!("../tests/fixtures/signing_key_pkcs8.pem");

    #[test]
    fn builder_chain() {
        let config = ServerConfig::new("https://server.test", "pivotal")
            .with_key_pem(PKCS8)
            .with_timeout_secs(5);

        assert_eq!(config.url, "https://server.test");
        assert_eq!(config.client_name, "pivotal");
        assert_eq!(config.timeout_secs, 5);
        config.resolve_key().expect("pem key should resolve");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let config = ServerConfig::new("https://server.test", "pivotal");
        let err = config.resolve_key().unwrap_err();
        assert!(matches!(err, ClientError::Config { .. }));
    }

    #[test]
    fn key_file_source_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.pem");
        std::fs::write(&path, PKCS8).unwrap();

        let config = ServerConfig::new("https://server.test", "pivotal").with_key_file(&path);
        config.resolve_key().expect("file key should resolve");
    }

    #[test]
    fn debug_never_prints_pem() {
        let config = ServerConfig::new("https://server.test", "pivotal").with_key_pem(PKCS8);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("BEGIN"));
    }
}
