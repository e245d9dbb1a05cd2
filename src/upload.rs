//! Upload planning and the multipart upload session.
//!
//! `store_stream` decides between one atomic put and a multipart upload by
//! observing the stream, not by trusting the caller: only a stream that
//! declares a total length within [`CHUNK_SIZE`] is written with a single
//! put. Everything else, unknown length included, goes through an
//! `UploadSession`, which owns the upload id from creation to its single
//! terminal transition (complete or abort) and guarantees the target key is
//! never left with partially visible content.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::store::{ObjectStore, Part};
use crate::stream::ByteStream;
use crate::{Error, Result};

/// Threshold for single-put writes and the size of every non-final
/// multipart part.
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Store-mandated minimum size for non-final parts. Parts are accumulated to
/// exactly `CHUNK_SIZE`, so only the final part may fall below this.
pub const MIN_PART_SIZE: usize = CHUNK_SIZE;

/// Write a byte stream under `key`, choosing the upload strategy.
///
/// A stream with a known total length of at most [`CHUNK_SIZE`] is buffered
/// and written with one atomic put; a zero-length stream puts empty content.
/// Any other stream, longer or of unknown length, is uploaded multipart.
pub(crate) async fn store_stream(
    store: &Arc<dyn ObjectStore>,
    key: &str,
    mut stream: ByteStream,
) -> Result<()> {
    let content_type = stream.content_type().to_string();

    if stream.known_length().is_some_and(|len| len <= CHUNK_SIZE as u64) {
        let data = stream.collect().await?;
        debug!(key, len = data.len(), "single put");
        return store.put(key, data, &content_type).await;
    }

    // Read the first chunk before touching the store, so a failing producer
    // never leaves an upload id behind.
    let first = stream.next_chunk().await?;

    let mut session = UploadSession::create(Arc::clone(store), key, &content_type).await?;
    match session.drive(first, &mut stream).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let parts_uploaded = session.parts_uploaded();
            session.abort().await;
            if parts_uploaded > 0 {
                Err(Error::UploadAborted { source: Box::new(err) })
            } else {
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Uploading,
    Completed,
    Aborted,
}

/// A multipart upload in flight.
///
/// Holds the store's upload id together with the ordered part list and
/// enforces the lifecycle: parts are numbered from 1 and strictly
/// increasing, and exactly one terminal transition happens. If the session
/// is dropped mid-flight (caller cancelled), a best-effort abort is spawned
/// so the upload id is not orphaned.
struct UploadSession {
    store: Arc<dyn ObjectStore>,
    key: String,
    upload_id: String,
    parts: Vec<Part>,
    next_part_number: i32,
    state: SessionState,
}

impl UploadSession {
    async fn create(store: Arc<dyn ObjectStore>, key: &str, content_type: &str) -> Result<Self> {
        let upload_id = store.create_upload(key, content_type).await?;
        debug!(key, %upload_id, "multipart upload created");
        Ok(Self {
            store,
            key: key.to_string(),
            upload_id,
            parts: Vec::new(),
            next_part_number: 1,
            state: SessionState::Uploading,
        })
    }

    fn parts_uploaded(&self) -> usize {
        self.parts.len()
    }

    /// Consume the stream, upload every part, and complete.
    async fn drive(&mut self, first: Option<Bytes>, stream: &mut ByteStream) -> Result<()> {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        if let Some(chunk) = first {
            buf.extend_from_slice(&chunk);
        }
        while buf.len() >= CHUNK_SIZE {
            let part = buf.split_to(CHUNK_SIZE).freeze();
            self.upload_part(part).await?;
        }

        while let Some(chunk) = stream.next_chunk().await? {
            buf.extend_from_slice(&chunk);
            while buf.len() >= CHUNK_SIZE {
                let part = buf.split_to(CHUNK_SIZE).freeze();
                self.upload_part(part).await?;
            }
        }

        // Final short part. When the stream produced nothing at all, a single
        // empty part still closes the upload without orphaning its id.
        if !buf.is_empty() || self.parts.is_empty() {
            self.upload_part(buf.freeze()).await?;
        }

        self.complete().await
    }

    async fn upload_part(&mut self, data: Bytes) -> Result<()> {
        let number = self.next_part_number;
        let etag = self
            .store
            .upload_part(&self.key, &self.upload_id, number, data)
            .await?;
        self.parts.push(Part { number, etag });
        self.next_part_number += 1;
        Ok(())
    }

    async fn complete(&mut self) -> Result<()> {
        self.store
            .complete_upload(&self.key, &self.upload_id, &self.parts)
            .await?;
        self.state = SessionState::Completed;
        debug!(key = %self.key, parts = self.parts.len(), "multipart upload completed");
        Ok(())
    }

    /// Best-effort abort; failures are logged and never mask the error that
    /// brought the session down.
    async fn abort(&mut self) {
        self.state = SessionState::Aborted;
        if let Err(err) = self.store.abort_upload(&self.key, &self.upload_id).await {
            warn!(
                key = %self.key,
                upload_id = %self.upload_id,
                error = %err,
                "failed to abort multipart upload; upload id may be orphaned"
            );
        }
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if self.state != SessionState::Uploading {
            return;
        }
        // Dropped without a terminal transition: the caller was cancelled.
        // Abort from a spawned task since Drop cannot await.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let key = std::mem::take(&mut self.key);
                let upload_id = std::mem::take(&mut self.upload_id);
                handle.spawn(async move {
                    if let Err(err) = store.abort_upload(&key, &upload_id).await {
                        warn!(%key, %upload_id, error = %err, "failed to abort cancelled multipart upload");
                    }
                });
            }
            Err(_) => {
                warn!(
                    key = %self.key,
                    upload_id = %self.upload_id,
                    "multipart upload dropped outside a runtime; upload id orphaned"
                );
            }
        }
    }
}
