//! Store configuration types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{MemoryStore, ObjectStore, S3Config, S3Store};
use crate::{Error, Result};

/// Object store configuration using a tagged enum for type-safe selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "store")]
pub enum StoreConfig {
    /// AWS S3 or S3-compatible storage (MinIO, Ceph RGW, etc.)
    #[serde(rename = "s3")]
    S3 {
        /// S3 bucket name
        bucket: String,
        /// AWS region (e.g., "us-east-1")
        #[serde(default)]
        region: Option<String>,
        /// Custom endpoint URL (for S3-compatible services like MinIO)
        #[serde(default)]
        endpoint: Option<String>,
        /// Access key ID (falls back to the default credentials chain)
        #[serde(default)]
        access_key: Option<String>,
        /// Secret access key
        #[serde(default)]
        secret_key: Option<String>,
        /// Use path-style requests (required for MinIO/Ceph RGW)
        #[serde(default)]
        path_style: bool,
    },

    /// In-memory storage (for testing)
    #[serde(rename = "memory")]
    Memory,
}

impl StoreConfig {
    /// Parse configuration from a URL string.
    ///
    /// Supported URL formats:
    /// - `s3://bucket-name?region=us-east-1&endpoint=http://localhost:9000&path_style=true`
    /// - `memory://`
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|err| Error::Config(format!("invalid store URL: {err}")))?;

        match parsed.scheme() {
            "s3" | "s3a" => {
                let bucket = parsed.host_str().unwrap_or_default().to_string();
                if bucket.is_empty() {
                    return Err(Error::Config("store URL is missing a bucket name".to_string()));
                }
                let query = |name: &str| {
                    parsed
                        .query_pairs()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| value.to_string())
                };
                Ok(Self::S3 {
                    bucket,
                    region: query("region"),
                    endpoint: query("endpoint"),
                    access_key: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                    secret_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                    path_style: query("path_style").is_some_and(|v| v == "true"),
                })
            }
            "memory" => Ok(Self::Memory),
            scheme => Err(Error::Config(format!("unknown store scheme: {scheme}"))),
        }
    }
}

/// Create an object store client from configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match config {
        StoreConfig::S3 {
            bucket,
            region,
            endpoint,
            access_key,
            secret_key,
            path_style,
        } => {
            let s3_config = S3Config {
                bucket: bucket.clone(),
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key.clone(),
                secret_access_key: secret_key.clone(),
                path_style: *path_style,
            };
            Ok(Arc::new(S3Store::connect(s3_config).await?))
        }
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
