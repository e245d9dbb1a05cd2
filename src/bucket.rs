//! Typed facades over a bucket and its objects.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::codec::Codec;
use crate::list::{self, ListQuery};
use crate::page::Page;
use crate::store::ObjectStore;
use crate::stream::ByteStream;
use crate::upload;
use crate::{Error, Result};

/// Key-space binding for a [`Bucket`]: an optional prefix prepended to every
/// key and an optional suffix appended to it. Listings strip both before
/// keys reach the caller.
#[derive(Debug, Clone, Default)]
pub struct BucketOptions {
    /// Prefix prepended to caller keys (e.g. `"records/"`)
    pub prefix: Option<String>,
    /// Suffix appended to caller keys (e.g. `".json"`)
    pub suffix: Option<String>,
}

/// Cursor and limit for one [`Bucket::keys`] call.
#[derive(Debug, Clone, Default)]
pub struct KeyQuery {
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    /// Maximum number of keys to return
    pub limit: Option<usize>,
}

/// Typed view over one bucket of an object store.
///
/// Binds the store client, a value codec, and the key-space options; hands
/// out per-key [`ObjectHandle`]s and lists keys through the paging engine.
pub struct Bucket<T> {
    store: Arc<dyn ObjectStore>,
    codec: Arc<dyn Codec<T>>,
    options: BucketOptions,
}

impl<T> Clone for Bucket<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
            options: self.options.clone(),
        }
    }
}

impl<T> fmt::Debug for Bucket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T> Bucket<T> {
    /// Create a typed bucket facade.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        codec: Arc<dyn Codec<T>>,
        options: BucketOptions,
    ) -> Self {
        Self { store, codec, options }
    }

    /// Handle for one object, addressed by its caller-visible key.
    ///
    /// The configured prefix and suffix are applied to form the store key.
    pub fn object(&self, key: &str) -> Result<ObjectHandle<T>> {
        if key.is_empty() {
            return Err(Error::InvalidInput("object key must not be empty".to_string()));
        }
        Ok(ObjectHandle {
            store: Arc::clone(&self.store),
            codec: Arc::clone(&self.codec),
            key: self.full_key(key),
        })
    }

    /// List caller-visible keys, in the store's lexicographic order.
    ///
    /// Keys are filtered to the configured prefix and suffix and returned
    /// with both stripped. An absent cursor in the result signals
    /// exhaustion.
    pub async fn keys(&self, query: &KeyQuery) -> Result<Page<String>> {
        let page = list::list_page(
            self.store.as_ref(),
            &ListQuery {
                prefix: self.options.prefix.clone(),
                suffix: self.options.suffix.clone(),
                cursor: query.cursor.clone(),
                limit: query.limit,
            },
        )
        .await?;

        debug!(count = page.items.len(), more = page.cursor.is_some(), "listed keys");
        let items = page
            .items
            .into_iter()
            .map(|key| self.strip_key(&key))
            .collect();
        Ok(Page { items, cursor: page.cursor })
    }

    fn full_key(&self, key: &str) -> String {
        let prefix = self.options.prefix.as_deref().unwrap_or("");
        let suffix = self.options.suffix.as_deref().unwrap_or("");
        format!("{prefix}{key}{suffix}")
    }

    fn strip_key(&self, key: &str) -> String {
        let stripped = match &self.options.prefix {
            Some(prefix) => key.strip_prefix(prefix.as_str()).unwrap_or(key),
            None => key,
        };
        let stripped = match &self.options.suffix {
            Some(suffix) => stripped.strip_suffix(suffix.as_str()).unwrap_or(stripped),
            None => stripped,
        };
        stripped.to_string()
    }
}

/// Typed access to a single object.
pub struct ObjectHandle<T> {
    store: Arc<dyn ObjectStore>,
    codec: Arc<dyn Codec<T>>,
    key: String,
}

impl<T> fmt::Debug for ObjectHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T> ObjectHandle<T> {
    /// Full store-side key this handle addresses.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fetch and decode the object; `Error::NotFound` when absent.
    pub async fn get(&self) -> Result<T> {
        let object = self.store.get(&self.key).await?;
        self.codec.decode(&object.data, &object.content_type)
    }

    /// Encode and write the object, overwriting any previous value.
    pub async fn put(&self, value: &T) -> Result<()> {
        let data = self.codec.encode(value)?;
        let stream = ByteStream::from_bytes(data, self.codec.content_type());
        upload::store_stream(&self.store, &self.key, stream).await
    }

    /// Write raw stream content under this key, bypassing the codec.
    ///
    /// Small streams with a known length are written with one atomic put;
    /// anything larger or of unknown length is uploaded multipart.
    pub async fn put_stream(&self, stream: ByteStream) -> Result<()> {
        upload::store_stream(&self.store, &self.key, stream).await
    }

    /// Fetch the raw bytes and content type, bypassing the codec.
    pub async fn get_raw(&self) -> Result<ByteStream> {
        let object = self.store.get(&self.key).await?;
        Ok(ByteStream::from_bytes(object.data, object.content_type))
    }

    /// Delete the object; `Error::NotFound` when absent.
    pub async fn delete(&self) -> Result<()> {
        self.store.delete(&self.key).await
    }
}
