//! Typed key/value access layer for S3-compatible object storage.
//!
//! This crate exposes buckets of a remote object store as typed key/value
//! collections. Values pass through a [`Codec`] on the way in and out;
//! writes are planned as either one atomic put or a multipart upload
//! depending on the observed payload, and listings present a filtered,
//! resumable cursor protocol over the store's bounded pages.
//!
//! ```no_run
//! use std::sync::Arc;
//! use bucketkv::{connect, Bucket, BucketOptions, JsonCodec, KeyQuery, StoreConfig};
//!
//! # #[derive(serde::Serialize, serde::Deserialize)]
//! # struct Order { id: String }
//! # async fn example() -> bucketkv::Result<()> {
//! let store = connect(&StoreConfig::from_url("s3://orders?region=us-east-1")?).await?;
//! let bucket: Bucket<Order> = Bucket::new(
//!     store,
//!     Arc::new(JsonCodec),
//!     BucketOptions { prefix: Some("orders/".into()), suffix: Some(".json".into()) },
//! );
//!
//! bucket.object("42")?.put(&Order { id: "42".into() }).await?;
//! let page = bucket.keys(&KeyQuery::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod codec;
pub mod config;
pub mod error;
pub mod list;
pub mod page;
pub mod store;
pub mod stream;
pub mod upload;

pub use bucket::{Bucket, BucketOptions, KeyQuery, ObjectHandle};
pub use codec::{Codec, JsonCodec, RawCodec, TextCodec};
pub use config::{connect, StoreConfig};
pub use error::{Error, Result};
pub use list::{ListQuery, DEFAULT_PAGE_SIZE};
pub use page::{paginate, Page};
pub use store::{KeyListing, MemoryStore, ObjectStore, Part, S3Config, S3Store, StoredObject};
pub use stream::ByteStream;
pub use upload::{CHUNK_SIZE, MIN_PART_SIZE};
