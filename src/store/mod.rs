//! Object store client abstraction and implementations.
//!
//! The [`ObjectStore`] trait is the boundary to the remote store: one bucket,
//! whole-object put/get/delete, token-paged listing, and the raw multipart
//! upload calls. Implementations:
//!
//! - **S3**: AWS S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
//! - **Memory**: in-process store for testing and local development
//!
//! Clients are stateless per call and safe to share across concurrent
//! operations; retries are the client's concern (the S3 SDK carries its own
//! retry policy), never this crate's.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// An object fetched from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object payload
    pub data: Bytes,
    /// Content type the object was stored with
    pub content_type: String,
}

/// One native page of keys from the store's listing API.
#[derive(Debug, Clone)]
pub struct KeyListing {
    /// Keys in the store's native (lexicographic) order
    pub keys: Vec<String>,
    /// Continuation token for the next native page; `None` when exhausted
    pub next_token: Option<String>,
}

/// An uploaded multipart part, as acknowledged by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part number, starting at 1 and strictly increasing
    pub number: i32,
    /// Content checksum returned by the store
    pub etag: String,
}

/// Client capability over a single bucket of a remote object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a whole object in one atomic call.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Fetch an object; fails with `Error::NotFound` when the key is absent.
    async fn get(&self, key: &str) -> Result<StoredObject>;

    /// Delete an object; fails with `Error::NotFound` when the key is absent.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Fetch one native listing page of at most `page_size` keys.
    async fn list(
        &self,
        prefix: Option<&str>,
        token: Option<&str>,
        page_size: usize,
    ) -> Result<KeyListing>;

    /// Start a multipart upload, returning the store's upload id.
    async fn create_upload(&self, key: &str, content_type: &str) -> Result<String>;

    /// Upload one part, returning its etag.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> Result<String>;

    /// Commit a multipart upload; `parts` must be in ascending part-number
    /// order. The object becomes visible atomically on success.
    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()>;

    /// Release an upload id and any stored parts without publishing anything.
    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<()>;
}
