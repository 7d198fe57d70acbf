//! Request signing (`algorithm=sha1;version=1.0`).
//!
//! Every request carries a signature over a canonical five-line string:
//!
//! ```text
//! Method:GET
//! Hashed Path:<b64(sha1(path))>
//! X-Ops-Content-Hash:<b64(sha1(body))>
//! X-Ops-Timestamp:2024-01-01T00:00:00Z
//! X-Ops-UserId:<client name>
//! ```
//!
//! The canonical bytes are signed with PKCS#1 v1.5 padding and **no digest
//! prefix** ([`Pkcs1v15Sign::new_unprefixed`]): the padding is applied to the
//! canonical bytes themselves, not to a SHA hash of them. The server re-derives
//! the same string and recovers it from the signature, so a conventional
//! hash-then-sign mode produces a signature it will reject.
//!
//! The base64 signature is split into 60-character chunks, one
//! `X-Ops-Authorization-N` header per chunk. Signing is stateless and performs
//! no I/O.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rsa::Pkcs1v15Sign;
use sha1::{Digest, Sha1};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::key::PrivateKey;

/// Value of the `X-Ops-Sign` header.
pub const SIGNING_PROTOCOL: &str = "algorithm=sha1;version=1.0";

/// Value of the `X-Chef-Version` marker header.
pub const CLIENT_VERSION: &str = "12.0.2";

/// Width of each `X-Ops-Authorization-N` chunk.
const AUTH_CHUNK_LEN: usize = 60;

/// Identity presented to the server: client name plus signing key.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Name the server knows this client by.
    pub client_name: String,

    /// RSA private key registered for that name.
    pub key: PrivateKey,
}

impl Identity {
    pub fn new(client_name: impl Into<String>, key: PrivateKey) -> Self {
        Self {
            client_name: client_name.into(),
            key,
        }
    }
}

/// Base64 of the SHA1 digest of `input`.
pub fn hash_string(input: &str) -> String {
    BASE64.encode(Sha1::digest(input.as_bytes()))
}

/// Format a timestamp the way the server expects: `yyyy-MM-ddTHH:mm:ssZ`, UTC.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Build the canonical five-line string for one request.
///
/// `path` is the URL's absolute path component only, no host or query. An
/// empty body is hashed like any other body, never omitted.
pub fn canonical_request(
    method: &str,
    path: &str,
    body: &str,
    timestamp: &str,
    client_name: &str,
) -> String {
    format!(
        "Method:{}\nHashed Path:{}\nX-Ops-Content-Hash:{}\nX-Ops-Timestamp:{}\nX-Ops-UserId:{}",
        method.to_uppercase(),
        hash_string(path),
        hash_string(body),
        timestamp,
        client_name,
    )
}

/// Sign the canonical string, returning the raw signature bytes.
///
/// Uses the unprefixed PKCS#1 v1.5 primitive over the canonical bytes. Do not
/// swap this for a hash-then-sign scheme: the result is wire-incompatible.
pub fn sign_canonical(key: &PrivateKey, canonical: &str) -> ClientResult<Vec<u8>> {
    key.rsa()
        .sign(Pkcs1v15Sign::new_unprefixed(), canonical.as_bytes())
        .map_err(|e| ClientError::Signing {
            message: e.to_string(),
        })
}

/// Split a base64 signature into numbered `X-Ops-Authorization-N` headers.
fn chunk_signature(signature_b64: &str) -> Vec<(String, String)> {
    signature_b64
        .as_bytes()
        .chunks(AUTH_CHUNK_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            (
                format!("X-Ops-Authorization-{}", i + 1),
                // Base64 is ASCII, so byte chunks are char chunks.
                String::from_utf8_lossy(chunk).into_owned(),
            )
        })
        .collect()
}

/// Produce the full authentication header set for one request.
///
/// The returned pairs cover everything the server requires: `Accept`,
/// `X-Ops-Sign`, `X-Ops-UserId`, `X-Ops-Timestamp`, `X-Ops-Content-Hash`,
/// `Host`, `X-Chef-Version`, and the chunked `X-Ops-Authorization-N` headers.
/// Deterministic for fixed inputs, including the timestamp.
pub fn sign_request(
    identity: &Identity,
    url: &Url,
    method: &str,
    body: &str,
    at: DateTime<Utc>,
) -> ClientResult<Vec<(String, String)>> {
    let timestamp = format_timestamp(at);
    let canonical = canonical_request(method, url.path(), body, &timestamp, &identity.client_name);
    let signature = sign_canonical(&identity.key, &canonical)?;

    let host = url.host_str().ok_or_else(|| ClientError::Signing {
        message: format!("url has no host: {}", url),
    })?;
    let port = url.port_or_known_default().unwrap_or(443);

    let mut headers = vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("X-Ops-Sign".to_string(), SIGNING_PROTOCOL.to_string()),
        ("X-Ops-UserId".to_string(), identity.client_name.clone()),
        ("X-Ops-Timestamp".to_string(), timestamp),
        ("X-Ops-Content-Hash".to_string(), hash_string(body)),
        ("Host".to_string(), format!("{}:{}", host, port)),
        ("X-Chef-Version".to_string(), CLIENT_VERSION.to_string()),
    ];
    headers.extend(chunk_signature(&BASE64.encode(&signature)));

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKCS8: &str = include_str!("../tests/fixtures/signing_key_pkcs8.pem");

    /// b64(sha1("")), the hash an empty body must produce.
    const EMPTY_BODY_HASH: &str = "2jmj7l5rSw0yVb/vlWAYkK/YBwk=";

    fn test_identity() -> Identity {
        Identity::new("pivotal", PrivateKey::from_pem(PKCS8).unwrap())
    }

    #[test]
    fn empty_body_hash_constant() {
        assert_eq!(hash_string(""), EMPTY_BODY_HASH);
    }

    #[test]
    fn timestamp_format() {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn canonical_string_shape() {
        let canonical = canonical_request(
            "get",
            "/organizations/acme/nodes",
            "",
            "2024-01-01T00:00:00Z",
            "pivotal",
        );
        let lines: Vec<&str> = canonical.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Method:GET");
        assert!(lines[1].starts_with("Hashed Path:"));
        assert_eq!(
            lines[2],
            "X-Ops-Content-Hash:2jmj7l5rSw0yVb/vlWAYkK/YBwk="
        );
        assert_eq!(lines[3], "X-Ops-Timestamp:2024-01-01T00:00:00Z");
        assert_eq!(lines[4], "X-Ops-UserId:pivotal");
        assert!(!canonical.ends_with('\n'));
    }

    #[test]
    fn signing_is_deterministic() {
        let identity = test_identity();
        let url = Url::parse("https://server.test/organizations/acme/nodes").unwrap();
        let at = Utc::now();

        let a = sign_request(&identity, &url, "GET", "", at).unwrap();
        let b = sign_request(&identity, &url, "GET", "", at).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chunk_reassembly_recovers_signature() {
        let identity = test_identity();
        let canonical = canonical_request(
            "GET",
            "/organizations/acme/nodes",
            "",
            "2024-01-01T00:00:00Z",
            "pivotal",
        );
        let signature = sign_canonical(&identity.key, &canonical).unwrap();
        let b64 = BASE64.encode(&signature);

        let chunks = chunk_signature(&b64);
        assert_eq!(chunks.len(), b64.len().div_ceil(AUTH_CHUNK_LEN));
        for (i, (name, value)) in chunks.iter().enumerate() {
            assert_eq!(name, &format!("X-Ops-Authorization-{}", i + 1));
            assert!(value.len() <= AUTH_CHUNK_LEN);
        }

        let reassembled: String = chunks.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(BASE64.decode(reassembled).unwrap(), signature);
    }

    #[test]
    fn signature_verifies_with_unprefixed_scheme() {
        let identity = test_identity();
        let canonical = canonical_request(
            "GET",
            "/organizations/acme/nodes",
            "",
            "2024-01-01T00:00:00Z",
            "pivotal",
        );
        let signature = sign_canonical(&identity.key, &canonical).unwrap();

        let public = identity.key.rsa().to_public_key();
        public
            .verify(
                Pkcs1v15Sign::new_unprefixed(),
                canonical.as_bytes(),
                &signature,
            )
            .expect("raw-mode signature must verify against the canonical bytes");
    }

    #[test]
    fn host_header_carries_port() {
        let identity = test_identity();

        let url = Url::parse("https://server.test:8443/organizations/acme").unwrap();
        let headers = sign_request(&identity, &url, "GET", "", Utc::now()).unwrap();
        let host = headers.iter().find(|(n, _)| n == "Host").unwrap();
        assert_eq!(host.1, "server.test:8443");

        // Default port is made explicit.
        let url = Url::parse("https://server.test/organizations/acme").unwrap();
        let headers = sign_request(&identity, &url, "GET", "", Utc::now()).unwrap();
        let host = headers.iter().find(|(n, _)| n == "Host").unwrap();
        assert_eq!(host.1, "server.test:443");
    }

    #[test]
    fn query_is_excluded_from_hashed_path() {
        let identity = test_identity();
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let plain = Url::parse("https://server.test/organizations/acme/nodes").unwrap();
        let query = Url::parse("https://server.test/organizations/acme/nodes?num_versions=3")
            .unwrap();

        assert_eq!(
            sign_request(&identity, &plain, "GET", "", at).unwrap(),
            sign_request(&identity, &query, "GET", "", at).unwrap(),
        );
    }
}
