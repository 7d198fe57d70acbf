//! API clients registered with an organization.

use serde::Deserialize;

use crate::error::ClientResult;
use crate::json;

#[derive(Debug, Deserialize)]
struct ApiClientDoc {
    name: String,
    #[serde(default)]
    validator: bool,
    #[serde(default)]
    public_key: Option<String>,
}

/// An API client (machine identity) within an organization.
#[derive(Debug, Clone)]
pub struct ApiClient {
    org: String,
    name: String,
    validator: bool,
    public_key: Option<String>,
}

impl PartialEq for ApiClient {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.name == other.name
    }
}

impl Eq for ApiClient {}

impl ApiClient {
    pub(crate) fn parse(org: &str, body: &str) -> ClientResult<Self> {
        let doc: ApiClientDoc = json::parse(body)?;
        Ok(Self {
            org: org.to_string(),
            name: doc.name,
            validator: doc.validator,
            public_key: doc.public_key,
        })
    }

    pub fn organization(&self) -> &str {
        &self.org
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a validator client.
    pub fn is_validator(&self) -> bool {
        self.validator
    }

    /// Registered public key, PEM-encoded, if the server returned it.
    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }
}

/// Server response to client creation.
///
/// Carries the generated private key; the server keeps only the public half,
/// so this is the one chance to capture it.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedClient {
    #[serde(default)]
    pub uri: Option<String>,
    pub private_key: String,
}
