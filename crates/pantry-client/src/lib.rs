//! Client SDK for the Pantry configuration server REST API.
//!
//! Every request is authenticated with a per-request RSA signature
//! (`algorithm=sha1;version=1.0`): a canonical five-line string is signed with
//! the client's private key and the base64 signature is chunked into
//! `X-Ops-Authorization-N` headers. On top of that sit the domain entities
//! (organizations, cookbooks, cookbook versions, nodes, and API clients) with
//! lazily-loaded, invalidatable child listings.
//!
//! # Quick Start
//!
//! ```no_run
//! use pantry_client::{Server, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::new("https://pantry.example.com", "ci-runner")
//!     .with_key_file("/etc/pantry/ci-runner.pem");
//! let server = Server::connect(&config)?;
//!
//! // First read fetches and caches; later reads are served from memory.
//! for org in server.organizations().await?.iter() {
//!     println!("{}", org.name());
//! }
//!
//! // Lookups by name always go to the server; absent entities are None.
//! if let Some(org) = server.organization("acme").await? {
//!     let nodes = org.nodes().await?;
//!     println!("{} nodes", nodes.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Caching
//!
//! Each parent entity owns one cache per child listing. Mutating operations
//! invalidate exactly the listing they made stale (deleting a node invalidates
//! the organization's node listing, nothing else), forcing the next read to
//! re-fetch. Cookbook version listings are never cached. There is no retry
//! and no background refresh: a failed request surfaces immediately.

pub mod api_client;
pub mod attributes;
pub mod cache;
pub mod config;
pub mod cookbook;
pub mod error;
mod json;
pub mod key;
pub mod node;
pub mod org;
pub mod server;
pub mod sign;
pub mod transport;

// Re-export main types
pub use api_client::{ApiClient, CreatedClient};
pub use attributes::{Attribute, AttributeTree};
pub use cache::Collection;
pub use config::{KeySource, ServerConfig};
pub use cookbook::{Cookbook, CookbookVersion, RemoteFile};
pub use error::{ClientError, ClientResult};
pub use key::PrivateKey;
pub use node::Node;
pub use org::Organization;
pub use server::Server;
pub use sign::{Identity, CLIENT_VERSION, SIGNING_PROTOCOL};
pub use transport::Transport;
