//! JSON decoding helper shared by the entity graph.

use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};

/// Decode a response body, mapping malformed or incomplete documents to
/// [`ClientError::Parse`]. Entity construction fails as a whole when a
/// required field is absent.
pub(crate) fn parse<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Parse {
        message: e.to_string(),
    })
}
