//! S3-compatible object store client using the AWS SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

use super::{KeyListing, ObjectStore, Part, StoredObject};
use crate::{Error, Result};

/// S3 store configuration.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region; falls back to the default provider chain when unset
    pub region: Option<String>,
    /// Custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
    /// Access key ID; falls back to the default credentials chain when unset
    pub access_key_id: Option<String>,
    /// Secret access key
    pub secret_access_key: Option<String>,
    /// Use path-style requests (required for MinIO/Ceph RGW)
    pub path_style: bool,
}

/// Object store client backed by a single S3 bucket.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Connect to S3 with the given configuration.
    ///
    /// Region and credentials not set explicitly are resolved through the
    /// SDK's default provider chain (environment, profile, instance role).
    pub async fn connect(config: S3Config) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(Error::Config("S3 bucket name is required".to_string()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.path_style {
            builder = builder.force_path_style(true);
        }
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder
                .credentials_provider(Credentials::new(access_key, secret_key, None, None, "s3-config"));
        }

        info!(bucket = %config.bucket, endpoint = ?config.endpoint, "connected S3 object store");
        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        })
    }
}

fn upstream<E, R>(op: &str, err: SdkError<E, R>) -> Error
where
    SdkError<E, R>: std::error::Error,
{
    Error::Upstream(format!("S3 {op} failed: {}", DisplayErrorContext(&err)))
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        debug!(key, len = data.len(), "S3 PUT");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|err| upstream("PUT", err))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        debug!(key, "S3 GET");
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                    return Err(Error::NotFound(key.to_string()));
                }
                return Err(upstream("GET", err));
            }
        };

        let content_type = resp
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = resp
            .body
            .collect()
            .await
            .map_err(|err| Error::Upstream(format!("failed to read S3 response body: {err}")))?
            .into_bytes();
        Ok(StoredObject { data, content_type })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!(key, "S3 DELETE");
        // S3's delete is silent on absent keys; probe first so absence is
        // reported to the caller.
        if let Err(err) = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            if err.as_service_error().is_some_and(HeadObjectError::is_not_found) {
                return Err(Error::NotFound(key.to_string()));
            }
            return Err(upstream("HEAD", err));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| upstream("DELETE", err))?;
        Ok(())
    }

    async fn list(
        &self,
        prefix: Option<&str>,
        token: Option<&str>,
        page_size: usize,
    ) -> Result<KeyListing> {
        debug!(?prefix, ?token, page_size, "S3 LIST");
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(page_size.min(1000) as i32);
        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }
        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let resp = request.send().await.map_err(|err| upstream("LIST", err))?;
        let keys = resp
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();
        Ok(KeyListing {
            keys,
            next_token: resp.next_continuation_token().map(str::to_string),
        })
    }

    async fn create_upload(&self, key: &str, content_type: &str) -> Result<String> {
        debug!(key, "S3 CREATE MULTIPART");
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| upstream("CREATE MULTIPART", err))?;
        resp.upload_id()
            .map(str::to_string)
            .ok_or_else(|| Error::Upstream("S3 returned no multipart upload id".to_string()))
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> Result<String> {
        debug!(key, upload_id, part_number, len = data.len(), "S3 UPLOAD PART");
        let resp = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(SdkByteStream::from(data))
            .send()
            .await
            .map_err(|err| upstream("UPLOAD PART", err))?;
        resp.e_tag()
            .map(str::to_string)
            .ok_or_else(|| Error::Upstream("S3 returned no etag for uploaded part".to_string()))
    }

    async fn complete_upload(&self, key: &str, upload_id: &str, parts: &[Part]) -> Result<()> {
        debug!(key, upload_id, parts = parts.len(), "S3 COMPLETE MULTIPART");
        let completed = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.number)
                    .e_tag(&part.etag)
                    .build()
            })
            .collect();
        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|err| upstream("COMPLETE MULTIPART", err))?;
        Ok(())
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        debug!(key, upload_id, "S3 ABORT MULTIPART");
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|err| upstream("ABORT MULTIPART", err))?;
        Ok(())
    }
}
