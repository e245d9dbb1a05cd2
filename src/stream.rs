//! Lazy byte stream abstraction for object payloads.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};

use crate::Result;

/// A lazy, single-pass sequence of byte chunks with a content type and an
/// optional known total length.
///
/// Chunks are produced on demand; once consumed they cannot be re-read.
/// Dropping the stream releases the underlying producer. A stream whose
/// `known_length` is `None` is treated as unbounded by the upload planner
/// and always uploaded multipart.
pub struct ByteStream {
    content_type: String,
    known_length: Option<u64>,
    chunks: BoxStream<'static, Result<Bytes>>,
}

impl ByteStream {
    /// Wrap an arbitrary chunk producer.
    ///
    /// `known_length` should be the exact total byte count when the caller
    /// knows it up front, and `None` otherwise.
    pub fn new<S>(chunks: S, content_type: impl Into<String>, known_length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            content_type: content_type.into(),
            known_length,
            chunks: chunks.boxed(),
        }
    }

    /// Single-chunk stream over fully buffered content; length is known.
    pub fn from_bytes(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let data = data.into();
        let len = data.len() as u64;
        let chunks = if data.is_empty() {
            futures::stream::iter(Vec::new())
        } else {
            futures::stream::iter(vec![Ok(data)])
        };
        Self::new(chunks, content_type, Some(len))
    }

    /// Content type tag carried alongside the bytes.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Total length in bytes, when declared by the producer.
    pub fn known_length(&self) -> Option<u64> {
        self.known_length
    }

    /// Fetch the next chunk, or `None` once the stream is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.chunks.try_next().await
    }

    /// Consume the stream, concatenating every remaining chunk.
    pub async fn collect(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.chunks.poll_next_unpin(cx)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("content_type", &self.content_type)
            .field("known_length", &self.known_length)
            .finish_non_exhaustive()
    }
}
