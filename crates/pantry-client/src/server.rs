//! Server connection and the organization listing.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::Collection;
use crate::config::ServerConfig;
use crate::error::ClientResult;
use crate::json;
use crate::org::Organization;
use crate::transport::Transport;

/// A connection to one server, authenticated as one client.
///
/// Owns the shared transport (and its connection pool) plus the cached
/// organization listing.
#[derive(Debug)]
pub struct Server {
    transport: Arc<Transport>,
    organizations: Collection<Organization>,
}

impl Server {
    /// Establish a connection. The identity is immutable afterwards.
    ///
    /// No request is sent here; a bad key or URL still fails eagerly.
    pub fn connect(config: &ServerConfig) -> ClientResult<Self> {
        Ok(Self {
            transport: Arc::new(Transport::new(config)?),
            organizations: Collection::new(),
        })
    }

    /// Client name this connection signs as.
    pub fn client_name(&self) -> &str {
        self.transport.client_name()
    }

    /// Base URL of the server.
    pub fn url(&self) -> &str {
        self.transport.base_url()
    }

    /// Organizations visible to this client. Cached after the first read.
    ///
    /// The index maps organization names to detail URLs; each entry costs one
    /// follow-up request on the first load.
    pub async fn organizations(&self) -> ClientResult<Arc<Vec<Organization>>> {
        self.organizations
            .get_or_load(|| async move {
                let path = format!("/users/{}/organizations", self.transport.client_name());
                let index: BTreeMap<String, String> =
                    json::parse(&self.transport.get(&path).await?)?;

                let mut organizations = Vec::with_capacity(index.len());
                for url in index.values() {
                    let body = self.transport.get_raw(url).await?;
                    organizations.push(Organization::parse(Arc::clone(&self.transport), &body)?);
                }
                Ok(organizations)
            })
            .await
    }

    /// Look up one organization by name, bypassing the cache.
    ///
    /// Returns `None` when the server reports not-found; any other failure
    /// propagates.
    pub async fn organization(&self, name: &str) -> ClientResult<Option<Organization>> {
        match self.transport.get(&format!("/organizations/{}", name)).await {
            Ok(body) => Ok(Some(Organization::parse(
                Arc::clone(&self.transport),
                &body,
            )?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
