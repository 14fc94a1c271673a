use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

/// All artifacts live under this prefix; the wipe operation enumerates it.
pub const ROOT_PREFIX: &str = "uploads/";

/// Durable blob storage for uploaded documents and their rasterized pages.
/// `upload` returns an opaque path used as the stored handle; there is no
/// dedup and no content addressing.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, filename: &str, content_type: &str, bytes: Bytes) -> Result<String>;

    /// Enumerates every object path under the storage root.
    async fn list_root(&self) -> Result<Vec<String>>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// S3/MinIO-backed object store scoped to a single bucket.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, filename: &str, content_type: &str, bytes: Bytes) -> Result<String> {
        // Fresh UUID segment per upload: identical filenames never collide.
        let key = format!("{ROOT_PREFIX}{}/{}", Uuid::new_v4(), filename);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        Ok(key)
    }

    async fn list_root(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(ROOT_PREFIX)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| anyhow!("S3 listing failed: {e}"))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed for {path}: {e}"))?;
        Ok(())
    }
}
