//! Private key material for request signing.
//!
//! Keys may be supplied as an in-memory [`rsa::RsaPrivateKey`], a PEM string
//! (PKCS#8 or PKCS#1), a PEM file path, or any reader yielding PEM text.
//! Only private keys are accepted; a public-key PEM fails construction.

use std::fmt;
use std::io::Read;
use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;

use crate::error::{ClientError, ClientResult};

/// RSA private key used to sign requests.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Wrap an already-parsed RSA private key.
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self { inner: key }
    }

    /// Parse a PEM-encoded private key.
    ///
    /// Accepts both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`) encodings.
    pub fn from_pem(pem: &str) -> ClientResult<Self> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map(|inner| Self { inner })
            .map_err(|e| ClientError::Key {
                message: format!("not a PEM-encoded RSA private key: {}", e),
            })
    }

    /// Load a PEM-encoded private key from a file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| ClientError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_pem(&pem)
    }

    /// Read a PEM-encoded private key from an open reader.
    pub fn from_pem_reader(mut reader: impl Read) -> ClientResult<Self> {
        let mut pem = String::new();
        reader
            .read_to_string(&mut pem)
            .map_err(|e| ClientError::Io {
                path: "<reader>".into(),
                message: e.to_string(),
            })?;
        Self::from_pem(&pem)
    }

    pub(crate) fn rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

// Key material must never end up in logs.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}
