//! Signed HTTP transport.
//!
//! The only component that issues network requests. Every outbound call is
//! signed via [`crate::sign`], sent through one shared `reqwest` client, and
//! surfaced as decoded text or a byte stream. Non-2xx statuses are hard
//! failures; there is no retry and no redirect policy beyond the transport
//! defaults.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::config::ServerConfig;
use crate::error::{ClientError, ClientResult};
use crate::sign::{self, Identity};

/// Signed transport bound to one server and one identity.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    identity: Identity,
}

impl Transport {
    /// Build a transport from configuration.
    ///
    /// Resolves the signing key eagerly so a bad key fails here, not on the
    /// first request.
    pub fn new(config: &ServerConfig) -> ClientResult<Self> {
        let key = config.resolve_key()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        // Normalize base URL (remove trailing slash) and validate it early.
        let base_url = config.url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ClientError::Config {
            message: format!("invalid server url {}: {}", config.url, e),
        })?;

        Ok(Self {
            http,
            base_url,
            identity: Identity::new(config.client_name.clone(), key),
        })
    }

    /// Base URL of the server, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client name this transport signs as.
    pub fn client_name(&self) -> &str {
        &self.identity.client_name
    }

    /// GET a server-relative path and return the response body as text.
    pub async fn get(&self, path: &str) -> ClientResult<String> {
        self.send(path, Method::GET, "").await
    }

    /// Send to a server-relative path and return the response body as text.
    pub async fn send(&self, path: &str, method: Method, body: &str) -> ClientResult<String> {
        let url = self.resolve(path)?;
        let response = self.execute(url, method, body).await?;
        Ok(response.text().await?)
    }

    /// GET a fully-qualified URL (server-returned link) and return text.
    pub async fn get_raw(&self, url: &str) -> ClientResult<String> {
        self.send_raw(url, Method::GET, "").await
    }

    /// Send to a fully-qualified URL and return the response body as text.
    pub async fn send_raw(&self, url: &str, method: Method, body: &str) -> ClientResult<String> {
        let url = self.parse(url)?;
        let response = self.execute(url, method, body).await?;
        Ok(response.text().await?)
    }

    /// GET a fully-qualified URL and return the open response byte stream.
    ///
    /// The stream is caller-owned; the connection is released when it is
    /// dropped or drained.
    pub async fn stream(
        &self,
        url: &str,
    ) -> ClientResult<impl Stream<Item = reqwest::Result<Bytes>>> {
        let url = self.parse(url)?;
        let response = self.execute(url, Method::GET, "").await?;
        Ok(response.bytes_stream())
    }

    fn resolve(&self, path: &str) -> ClientResult<Url> {
        self.parse(&format!(
            "{}/{}",
            self.base_url,
            path.trim_start_matches('/')
        ))
    }

    fn parse(&self, url: &str) -> ClientResult<Url> {
        Url::parse(url).map_err(|e| ClientError::Config {
            message: format!("invalid url {}: {}", url, e),
        })
    }

    /// Sign and send one request; non-2xx statuses abort.
    async fn execute(
        &self,
        url: Url,
        method: Method,
        body: &str,
    ) -> ClientResult<reqwest::Response> {
        debug!(method = %method, url = %url, "sending signed request");

        let signed = sign::sign_request(&self.identity, &url, method.as_str(), body, Utc::now())?;
        let mut headers = HeaderMap::new();
        for (name, value) in signed {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ClientError::Signing {
                    message: format!("invalid header name {}: {}", name, e),
                }
            })?;
            let value = HeaderValue::from_str(&value).map_err(|e| ClientError::Signing {
                message: format!("invalid header value: {}", e),
            })?;
            headers.insert(name, value);
        }

        let mut request = self.http.request(method.clone(), url.clone()).headers(headers);
        if method != Method::GET {
            // The caller pre-serializes; the payload is always declared JSON.
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}
