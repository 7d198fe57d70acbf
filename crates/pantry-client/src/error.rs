//! Error types for the client.

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request signing failed.
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// Key material is malformed or is not an RSA private key.
    #[error("invalid private key: {message}")]
    Key { message: String },

    /// Server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body could not be parsed into an entity.
    #[error("invalid response: {message}")]
    Parse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Key file could not be read.
    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl ClientError {
    /// Whether this error means "the entity does not exist on the server".
    ///
    /// Lookup-by-name operations convert exactly this class into `None`;
    /// every other failure propagates untouched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let err = ClientError::Status {
            status: 404,
            url: "https://server.test/organizations/acme/nodes/ghost".into(),
        };
        assert!(err.is_not_found());

        let err = ClientError::Status {
            status: 500,
            url: "https://server.test/organizations/acme".into(),
        };
        assert!(!err.is_not_found());

        let err = ClientError::Parse {
            message: "missing field `name`".into(),
        };
        assert!(!err.is_not_found());
    }
}
