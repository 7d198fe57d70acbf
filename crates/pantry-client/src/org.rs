//! Organizations and their child listings.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::api_client::{ApiClient, CreatedClient};
use crate::cache::Collection;
use crate::cookbook::{Cookbook, CookbookIndexEntry};
use crate::error::{ClientError, ClientResult};
use crate::json;
use crate::node::Node;
use crate::transport::Transport;

#[derive(Debug, Deserialize)]
struct OrganizationDoc {
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    guid: Option<String>,
}

/// One organization on the server.
///
/// Owns the cached client, node, and cookbook listings. Cookbook *version*
/// listings are deliberately not cached; see [`Cookbook::versions`].
#[derive(Debug, Clone)]
pub struct Organization {
    transport: Arc<Transport>,
    name: String,
    full_name: Option<String>,
    guid: Option<String>,
    clients: Arc<Collection<ApiClient>>,
    nodes: Arc<Collection<Node>>,
    cookbooks: Arc<Collection<Cookbook>>,
}

// Identity is the server plus the organization name, never cached state.
impl PartialEq for Organization {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.transport.base_url() == other.transport.base_url()
    }
}

impl Eq for Organization {}

impl Organization {
    pub(crate) fn parse(transport: Arc<Transport>, body: &str) -> ClientResult<Self> {
        let doc: OrganizationDoc = json::parse(body)?;
        Ok(Self {
            transport,
            name: doc.name,
            full_name: doc.full_name,
            guid: doc.guid,
            clients: Arc::new(Collection::new()),
            nodes: Arc::new(Collection::new()),
            cookbooks: Arc::new(Collection::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    fn path(&self, tail: &str) -> String {
        format!("/organizations/{}/{}", self.name, tail)
    }

    /// Fetch a name→URL index listing.
    async fn index(&self, tail: &str) -> ClientResult<BTreeMap<String, String>> {
        json::parse(&self.transport.get(&self.path(tail)).await?)
    }

    // ---- clients ----------------------------------------------------------

    /// API clients registered in this organization. Cached after first read.
    pub async fn clients(&self) -> ClientResult<Arc<Vec<ApiClient>>> {
        self.clients
            .get_or_load(|| async move {
                let index = self.index("clients").await?;
                let mut clients = Vec::with_capacity(index.len());
                for url in index.values() {
                    let body = self.transport.get_raw(url).await?;
                    clients.push(ApiClient::parse(&self.name, &body)?);
                }
                Ok(clients)
            })
            .await
    }

    /// Look up one client by name, bypassing the cache.
    pub async fn client(&self, name: &str) -> ClientResult<Option<ApiClient>> {
        match self
            .transport
            .get(&self.path(&format!("clients/{}", name)))
            .await
        {
            Ok(body) => Ok(Some(ApiClient::parse(&self.name, &body)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Register a new API client.
    ///
    /// The server generates the key pair and returns the private half; it is
    /// not retrievable again. Invalidates the client listing.
    pub async fn create_client(&self, name: &str) -> ClientResult<CreatedClient> {
        let body = serde_json::json!({ "name": name }).to_string();
        let response = self
            .transport
            .send(&self.path("clients"), Method::POST, &body)
            .await?;
        let created = json::parse(&response)?;
        self.clients.invalidate().await;
        Ok(created)
    }

    /// Delete a client. Invalidates the client listing on success.
    pub async fn delete_client(&self, name: &str) -> ClientResult<()> {
        self.transport
            .send(&self.path(&format!("clients/{}", name)), Method::DELETE, "")
            .await?;
        self.clients.invalidate().await;
        Ok(())
    }

    // ---- nodes ------------------------------------------------------------

    /// Nodes in this organization. Cached after first read.
    pub async fn nodes(&self) -> ClientResult<Arc<Vec<Node>>> {
        self.nodes
            .get_or_load(|| async move {
                let index = self.index("nodes").await?;
                let mut nodes = Vec::with_capacity(index.len());
                for url in index.values() {
                    let body = self.transport.get_raw(url).await?;
                    nodes.push(Node::parse(&self.name, &body)?);
                }
                Ok(nodes)
            })
            .await
    }

    /// Look up one node by name, bypassing the cache.
    pub async fn node(&self, name: &str) -> ClientResult<Option<Node>> {
        match self
            .transport
            .get(&self.path(&format!("nodes/{}", name)))
            .await
        {
            Ok(body) => Ok(Some(Node::parse(&self.name, &body)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a node. Invalidates the node listing on success.
    pub async fn delete_node(&self, name: &str) -> ClientResult<()> {
        self.transport
            .send(&self.path(&format!("nodes/{}", name)), Method::DELETE, "")
            .await?;
        self.nodes.invalidate().await;
        Ok(())
    }

    // ---- cookbooks --------------------------------------------------------

    /// Cookbooks in this organization. Cached after first read.
    ///
    /// The cookbook index carries the version summary inline, so loading the
    /// listing costs a single request.
    pub async fn cookbooks(&self) -> ClientResult<Arc<Vec<Cookbook>>> {
        self.cookbooks
            .get_or_load(|| async move {
                let index: BTreeMap<String, CookbookIndexEntry> =
                    json::parse(&self.transport.get(&self.path("cookbooks")).await?)?;
                Ok(index
                    .into_iter()
                    .map(|(name, entry)| {
                        Cookbook::new(Arc::clone(&self.transport), &self.name, name, entry.url)
                    })
                    .collect())
            })
            .await
    }

    /// Look up one cookbook by name, bypassing the cache.
    pub async fn cookbook(&self, name: &str) -> ClientResult<Option<Cookbook>> {
        match self
            .transport
            .get(&self.path(&format!("cookbooks/{}", name)))
            .await
        {
            Ok(body) => {
                let mut index: BTreeMap<String, CookbookIndexEntry> = json::parse(&body)?;
                let entry = index.remove(name).ok_or_else(|| ClientError::Parse {
                    message: format!("cookbook document missing entry for {}", name),
                })?;
                Ok(Some(Cookbook::new(
                    Arc::clone(&self.transport),
                    &self.name,
                    name.to_string(),
                    entry.url,
                )))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a cookbook: one DELETE per version, all in flight together.
    ///
    /// If any delete fails the aggregate fails and the cookbook listing is
    /// left untouched; the listing is invalidated only after every version is
    /// gone.
    pub async fn delete_cookbook(&self, name: &str) -> ClientResult<()> {
        let body = self
            .transport
            .get(&self.path(&format!("cookbooks/{}", name)))
            .await?;
        let mut index: BTreeMap<String, CookbookIndexEntry> = json::parse(&body)?;
        let entry = index.remove(name).ok_or_else(|| ClientError::Parse {
            message: format!("cookbook document missing entry for {}", name),
        })?;

        debug!(
            cookbook = name,
            versions = entry.versions.len(),
            "deleting all cookbook versions"
        );

        // Fan-out, then wait for every delete before judging the aggregate.
        let paths: Vec<String> = entry
            .versions
            .iter()
            .map(|v| self.path(&format!("cookbooks/{}/{}", name, v.version)))
            .collect();
        let results = join_all(
            paths
                .iter()
                .map(|path| self.transport.send(path, Method::DELETE, "")),
        )
        .await;
        for result in results {
            result?;
        }

        self.cookbooks.invalidate().await;
        Ok(())
    }
}
