//! In-memory object store for testing.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use md5::{Digest, Md5};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{KeyListing, ObjectStore, Part, StoredObject};
use crate::{Error, Result};

/// An in-flight multipart upload.
struct PendingUpload {
    key: String,
    content_type: String,
    /// Uploaded parts by part number: (etag, data)
    parts: HashMap<i32, (String, Bytes)>,
}

#[derive(Default)]
struct Inner {
    /// Objects ordered lexicographically by key, matching S3 listing order.
    objects: BTreeMap<String, StoredObject>,
    uploads: HashMap<String, PendingUpload>,
}

/// In-memory object store.
///
/// Implements the full client surface, including token-paged listing and the
/// multipart upload lifecycle, so the upload and pagination machinery can be
/// exercised without a network. Data does not persist between runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of multipart uploads that have been created but neither
    /// completed nor aborted. Useful for asserting that no upload id leaks.
    pub fn pending_uploads(&self) -> usize {
        self.inner.lock().uploads.len()
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }
}

fn etag_of(data: &[u8]) -> String {
    format!("\"{:x}\"", Md5::digest(data))
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        debug!(key, len = data.len(), "memory PUT");
        self.inner.lock().objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        debug!(key, "memory GET");
        self.inner
            .lock()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!(key, "memory DELETE");
        self.inner
            .lock()
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn list(
        &self,
        prefix: Option<&str>,
        token: Option<&str>,
        page_size: usize,
    ) -> Result<KeyListing> {
        debug!(?prefix, ?token, page_size, "memory LIST");
        let inner = self.inner.lock();
        let mut matches = inner.objects.keys().filter(|key| {
            prefix.is_none_or(|p| key.starts_with(p)) && token.is_none_or(|t| key.as_str() > t)
        });
        let keys: Vec<String> = matches.by_ref().take(page_size).cloned().collect();
        // The token is the last key of the page; listing resumes strictly
        // after it, so no key is repeated or skipped.
        let next_token = if matches.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };
        Ok(KeyListing { keys, next_token })
    }

    async fn create_upload(&self, key: &str, content_type: &str) -> Result<String> {
        let upload_id = Uuid::new_v4().to_string();
        debug!(key, %upload_id, "memory CREATE UPLOAD");
        self.inner.lock().uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: HashMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> Result<String> {
        debug!(key, upload_id, part_number, len = data.len(), "memory UPLOAD PART");
        if part_number < 1 {
            return Err(Error::InvalidInput(format!(
                "part number must be positive, got {part_number}"
            )));
        }
        let mut inner = self.inner.lock();
        let upload = inner
            .uploads
            .get_mut(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| Error::InvalidInput(format!("unknown multipart upload: {upload_id}")))?;
        let etag = etag_of(&data);
        upload.parts.insert(part_number, (etag.clone(), data));
        Ok(etag)
    }

    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()> {
        debug!(key, upload_id, parts = parts.len(), "memory COMPLETE UPLOAD");
        let mut inner = self.inner.lock();
        let upload = inner
            .uploads
            .get(upload_id)
            .filter(|upload| upload.key == key)
            .ok_or_else(|| Error::InvalidInput(format!("unknown multipart upload: {upload_id}")))?;

        if parts.is_empty() {
            return Err(Error::InvalidInput(
                "multipart completion requires at least one part".to_string(),
            ));
        }
        let mut data = BytesMut::new();
        let mut previous = 0;
        for part in parts {
            if part.number <= previous {
                return Err(Error::InvalidInput(format!(
                    "part numbers must be strictly ascending, got {} after {previous}",
                    part.number
                )));
            }
            previous = part.number;
            let (etag, body) = upload.parts.get(&part.number).ok_or_else(|| {
                Error::InvalidInput(format!("part {} was never uploaded", part.number))
            })?;
            if *etag != part.etag {
                return Err(Error::InvalidInput(format!(
                    "etag mismatch for part {}",
                    part.number
                )));
            }
            data.extend_from_slice(body);
        }

        let content_type = upload.content_type.clone();
        inner.uploads.remove(upload_id);
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                data: data.freeze(),
                content_type,
            },
        );
        Ok(())
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        debug!(key, upload_id, "memory ABORT UPLOAD");
        self.inner
            .lock()
            .uploads
            .remove(upload_id)
            .map(|_| ())
            .ok_or_else(|| Error::InvalidInput(format!("unknown multipart upload: {upload_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put("a", Bytes::from("payload"), "text/plain")
            .await
            .unwrap();

        let object = store.get("a").await.unwrap();
        assert_eq!(object.data, Bytes::from("payload"));
        assert_eq!(object.content_type, "text/plain");

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap_err().is_not_found());
        assert!(store.delete("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_pages_resume_without_gaps() {
        let store = MemoryStore::new();
        for n in 0..7 {
            store
                .put(&format!("k{n}"), Bytes::from("x"), "text/plain")
                .await
                .unwrap();
        }

        let first = store.list(None, None, 3).await.unwrap();
        assert_eq!(first.keys, vec!["k0", "k1", "k2"]);
        let token = first.next_token.expect("more pages remain");

        let second = store.list(None, Some(&token), 3).await.unwrap();
        assert_eq!(second.keys, vec!["k3", "k4", "k5"]);

        let third = store
            .list(None, second.next_token.as_deref(), 3)
            .await
            .unwrap();
        assert_eq!(third.keys, vec!["k6"]);
        assert!(third.next_token.is_none());
    }

    #[tokio::test]
    async fn test_list_prefix_filter() {
        let store = MemoryStore::new();
        for key in ["logs/a", "logs/b", "state/a"] {
            store.put(key, Bytes::from("x"), "text/plain").await.unwrap();
        }
        let page = store.list(Some("logs/"), None, 10).await.unwrap();
        assert_eq!(page.keys, vec!["logs/a", "logs/b"]);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_multipart_lifecycle() {
        let store = MemoryStore::new();
        let upload_id = store.create_upload("big", "application/octet-stream").await.unwrap();

        let etag1 = store
            .upload_part("big", &upload_id, 1, Bytes::from("aaaa"))
            .await
            .unwrap();
        let etag2 = store
            .upload_part("big", &upload_id, 2, Bytes::from("bb"))
            .await
            .unwrap();

        let parts = vec![
            Part { number: 1, etag: etag1 },
            Part { number: 2, etag: etag2 },
        ];
        store.complete_upload("big", &upload_id, &parts).await.unwrap();
        assert_eq!(store.pending_uploads(), 0);

        let object = store.get("big").await.unwrap();
        assert_eq!(object.data, Bytes::from("aaaabb"));
        assert_eq!(object.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_complete_rejects_out_of_order_parts() {
        let store = MemoryStore::new();
        let upload_id = store.create_upload("big", "application/octet-stream").await.unwrap();
        let etag1 = store
            .upload_part("big", &upload_id, 1, Bytes::from("a"))
            .await
            .unwrap();
        let etag2 = store
            .upload_part("big", &upload_id, 2, Bytes::from("b"))
            .await
            .unwrap();

        let parts = vec![
            Part { number: 2, etag: etag2 },
            Part { number: 1, etag: etag1 },
        ];
        let err = store.complete_upload("big", &upload_id, &parts).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        // The failed completion leaves the upload open and the key invisible.
        assert_eq!(store.pending_uploads(), 1);
        assert!(store.get("big").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_abort_releases_upload() {
        let store = MemoryStore::new();
        let upload_id = store.create_upload("big", "application/octet-stream").await.unwrap();
        store
            .upload_part("big", &upload_id, 1, Bytes::from("a"))
            .await
            .unwrap();

        store.abort_upload("big", &upload_id).await.unwrap();
        assert_eq!(store.pending_uploads(), 0);
        assert!(store.get("big").await.unwrap_err().is_not_found());

        let err = store
            .upload_part("big", &upload_id, 2, Bytes::from("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
