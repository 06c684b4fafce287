//! ForgeHub Forge Client
//!
//! A Rust HTTP client for a Gitea-compatible Git forge, covering the three
//! upstream operations ForgeHub needs:
//!
//! - **Tree listing**: recursive tree of a repository revision
//! - **Content fetch**: a single small file through the structured API
//!   (base64 JSON envelope), decoded to UTF-8 text
//! - **Streaming fetch**: raw file bytes of arbitrary size, relayed without
//!   buffering, with byte-range passthrough
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use forgehub_client::{ForgeClient, ForgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ForgeClient::new(
//!         ForgeConfig::builder("http://gitea:3000/api/v1", "http://gitea:3000")
//!             .build()?,
//!     )?;
//!
//!     let tree = client.get_tree("acme", "widgets", "main", None).await?;
//!     for entry in &tree.tree {
//!         println!("{} ({})", entry.path, entry.entry_type);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! [`ForgeClient::stream_file`] returns a [`FileStream`] handle that bundles
//! the upstream status, headers, and an unread body. The caller owns its
//! lifecycle: either `close()` it without reading (e.g. on an upstream 401)
//! or convert it into a [`RelayStream`] and forward the chunks. In both
//! cases the upstream connection is released exactly once, even when the
//! relay is abandoned partway through.
//!
//! # Error Handling
//!
//! All operations return `Result<T, ForgeError>`. Any unexpected non-2xx
//! upstream status surfaces as `ForgeError::Upstream { status, body }`; a
//! content-fetch 404 is absorbed into `Ok(None)`. There are no retries.

pub mod client;
pub mod config;
pub mod error;
pub mod stream;
pub mod types;

// Re-exports for convenience
pub use client::{ForgeClient, SharedForgeClient};
pub use config::{ForgeConfig, ForgeConfigBuilder};
pub use error::{ForgeError, Result};
pub use stream::{FileStream, RelayStream, StreamGuard};
pub use types::{ContentsResponse, TreeEntry, TreeResponse};
