//! Cookbooks, cookbook versions, and their remote files.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};
use crate::json;
use crate::transport::Transport;

/// One entry of the cookbook index: detail URL plus version summary.
///
/// The cookbook index differs in shape from the client/node indexes, which
/// map names straight to URLs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CookbookIndexEntry {
    pub url: String,
    #[serde(default)]
    pub versions: Vec<VersionRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VersionRef {
    pub url: String,
    pub version: String,
}

/// A cookbook within an organization.
#[derive(Debug, Clone)]
pub struct Cookbook {
    transport: Arc<Transport>,
    org: String,
    name: String,
    url: String,
}

impl PartialEq for Cookbook {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.name == other.name
    }
}

impl Eq for Cookbook {}

impl Cookbook {
    pub(crate) fn new(
        transport: Arc<Transport>,
        org: &str,
        name: String,
        url: String,
    ) -> Self {
        Self {
            transport,
            org: org.to_string(),
            name,
            url,
        }
    }

    pub fn organization(&self) -> &str {
        &self.org
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detail URL the server returned for this cookbook.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn path(&self, tail: &str) -> String {
        format!("/organizations/{}/cookbooks/{}{}", self.org, self.name, tail)
    }

    /// All versions of this cookbook, fully resolved.
    ///
    /// Never cached: the version list is re-fetched on every call, then each
    /// version costs one detail request.
    pub async fn versions(&self) -> ClientResult<Vec<CookbookVersion>> {
        let body = self.transport.get(&self.path("")).await?;
        let mut index: BTreeMap<String, CookbookIndexEntry> = json::parse(&body)?;
        let entry = index.remove(&self.name).ok_or_else(|| ClientError::Parse {
            message: format!("cookbook document missing entry for {}", self.name),
        })?;

        let mut versions = Vec::with_capacity(entry.versions.len());
        for vref in &entry.versions {
            let detail = self.transport.get_raw(&vref.url).await?;
            versions.push(CookbookVersion::parse(
                Arc::clone(&self.transport),
                &self.org,
                &detail,
            )?);
        }
        Ok(versions)
    }

    /// Look up one version, always against the server.
    pub async fn version(&self, version: &str) -> ClientResult<Option<CookbookVersion>> {
        match self
            .transport
            .get(&self.path(&format!("/{}", version)))
            .await
        {
            Ok(body) => Ok(Some(CookbookVersion::parse(
                Arc::clone(&self.transport),
                &self.org,
                &body,
            )?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn default_specificity() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
struct FileDoc {
    name: String,
    #[serde(default)]
    path: String,
    url: String,
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default = "default_specificity")]
    specificity: String,
}

#[derive(Debug, Deserialize)]
struct CookbookVersionDoc {
    cookbook_name: String,
    version: String,
    #[serde(default, rename = "frozen?")]
    frozen: bool,
    #[serde(default)]
    root_files: Vec<FileDoc>,
    #[serde(default)]
    recipes: Vec<FileDoc>,
    #[serde(default)]
    attributes: Vec<FileDoc>,
    #[serde(default)]
    definitions: Vec<FileDoc>,
    #[serde(default)]
    libraries: Vec<FileDoc>,
    #[serde(default)]
    templates: Vec<FileDoc>,
    #[serde(default)]
    files: Vec<FileDoc>,
    #[serde(default)]
    resources: Vec<FileDoc>,
    #[serde(default)]
    providers: Vec<FileDoc>,
}

/// One version of a cookbook, with its file manifest.
#[derive(Debug, Clone)]
pub struct CookbookVersion {
    org: String,
    cookbook: String,
    version: String,
    frozen: bool,
    files: Vec<RemoteFile>,
}

impl PartialEq for CookbookVersion {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.cookbook == other.cookbook && self.version == other.version
    }
}

impl Eq for CookbookVersion {}

impl CookbookVersion {
    pub(crate) fn parse(
        transport: Arc<Transport>,
        org: &str,
        body: &str,
    ) -> ClientResult<Self> {
        let doc: CookbookVersionDoc = json::parse(body)?;

        let segments = [
            ("root_files", doc.root_files),
            ("recipes", doc.recipes),
            ("attributes", doc.attributes),
            ("definitions", doc.definitions),
            ("libraries", doc.libraries),
            ("templates", doc.templates),
            ("files", doc.files),
            ("resources", doc.resources),
            ("providers", doc.providers),
        ];

        let mut files = Vec::new();
        for (segment, docs) in segments {
            for file in docs {
                files.push(RemoteFile {
                    transport: Arc::clone(&transport),
                    segment: segment.to_string(),
                    name: file.name,
                    path: file.path,
                    url: file.url,
                    checksum: file.checksum,
                    specificity: file.specificity,
                });
            }
        }

        Ok(Self {
            org: org.to_string(),
            cookbook: doc.cookbook_name,
            version: doc.version,
            frozen: doc.frozen,
            files,
        })
    }

    pub fn organization(&self) -> &str {
        &self.org
    }

    pub fn cookbook_name(&self) -> &str {
        &self.cookbook
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Every file in the manifest, across all segments.
    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    /// Files belonging to one manifest segment, e.g. `recipes`.
    pub fn files_in<'a>(
        &'a self,
        segment: &'a str,
    ) -> impl Iterator<Item = &'a RemoteFile> + 'a {
        self.files.iter().filter(move |f| f.segment == segment)
    }
}

/// A file stored by the server, downloadable on demand.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    transport: Arc<Transport>,
    segment: String,
    name: String,
    path: String,
    url: String,
    checksum: Option<String>,
    specificity: String,
}

impl RemoteFile {
    /// Manifest segment this file belongs to.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path within the cookbook.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    pub fn specificity(&self) -> &str {
        &self.specificity
    }

    /// Download the file, buffered into a string.
    pub async fn content(&self) -> ClientResult<String> {
        self.transport.get_raw(&self.url).await
    }

    /// Download the file as an open byte stream (for large files).
    pub async fn stream(
        &self,
    ) -> ClientResult<impl Stream<Item = reqwest::Result<Bytes>>> {
        self.transport.stream(&self.url).await
    }
}
