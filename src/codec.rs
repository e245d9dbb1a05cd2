//! Typed value codecs.
//!
//! A [`Codec`] turns an application value into bytes plus a content type tag
//! and back. Codec failures surface as [`Error::Codec`] and are the caller's
//! responsibility; the storage layer never retries or wraps them.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Converts values of one type to and from a byte representation.
pub trait Codec<T>: Send + Sync {
    /// Content type tag written alongside encoded values.
    fn content_type(&self) -> &str;

    /// Encode a value into bytes.
    fn encode(&self, value: &T) -> Result<Bytes>;

    /// Decode bytes fetched from the store.
    ///
    /// `content_type` is the tag the object was stored with; codecs may use
    /// it to reject payloads they do not understand.
    fn decode(&self, data: &[u8], content_type: &str) -> Result<T>;
}

/// JSON codec for any serde-capable value type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, data: &[u8], _content_type: &str) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// UTF-8 text codec for `String` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn content_type(&self) -> &str {
        "text/plain; charset=utf-8"
    }

    fn encode(&self, value: &String) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, data: &[u8], _content_type: &str) -> Result<String> {
        String::from_utf8(data.to_vec())
            .map_err(|err| Error::Codec(format!("invalid UTF-8 text object: {err}")))
    }
}

/// Pass-through codec for raw byte values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec<Bytes> for RawCodec {
    fn content_type(&self) -> &str {
        "application/octet-stream"
    }

    fn encode(&self, value: &Bytes) -> Result<Bytes> {
        Ok(value.clone())
    }

    fn decode(&self, data: &[u8], _content_type: &str) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(data))
    }
}
