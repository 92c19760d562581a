//! Blob storage for small text objects such as the latest-tag marker.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use crate::config::{BlobStorageKind, S3Config};
use crate::errors::AppError;

/// Key/value object store holding small text objects.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Read an object; `None` when it does not exist yet.
    async fn download(&self, key: &str) -> Result<Option<String>, AppError>;
    /// Create or overwrite an object.
    async fn upload(&self, key: &str, content: &str) -> Result<(), AppError>;
}

/// Build the configured blob storage backend.
pub fn from_config(kind: &BlobStorageKind) -> Result<Arc<dyn BlobStorage>, AppError> {
    match kind {
        BlobStorageKind::Local { dir } => Ok(Arc::new(FilesystemBlobStorage::new(dir.clone()))),
        BlobStorageKind::S3(config) => Ok(Arc::new(S3BlobStorage::new(config)?)),
    }
}

/// Objects stored as files under a base directory.
pub struct FilesystemBlobStorage {
    base_dir: PathBuf,
}

impl FilesystemBlobStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl BlobStorage for FilesystemBlobStorage {
    async fn download(&self, key: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.base_dir.join(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(&self, key: &str, content: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::write(self.base_dir.join(key), content).await?;
        Ok(())
    }
}

/// Objects stored in an S3-compatible bucket.
pub struct S3BlobStorage {
    bucket: Box<Bucket>,
}

impl S3BlobStorage {
    pub fn new(config: &S3Config) -> Result<Self, AppError> {
        if config.bucket.is_empty() {
            return Err(AppError::Internal(
                "RN_BLOB_S3_BUCKET is required for S3 blob storage".to_string(),
            ));
        }

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid S3 region: {}", e)))?,
        };

        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)
            }
            _ => Credentials::default(),
        }
        .map_err(|e| AppError::Internal(format!("Invalid S3 credentials: {}", e)))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    async fn download(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) => Ok(Some(
                String::from_utf8_lossy(&response.to_vec()).into_owned(),
            )),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(&self, key: &str, content: &str) -> Result<(), AppError> {
        self.bucket.put_object(key, content.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_filesystem_missing_object_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FilesystemBlobStorage::new(dir.path());
        assert!(storage.download("latest.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filesystem_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let storage = FilesystemBlobStorage::new(dir.path().join("nested"));

        storage.upload("latest.txt", "v1.0.0").await.unwrap();
        storage.upload("latest.txt", "v1.1.0").await.unwrap();

        assert_eq!(
            storage.download("latest.txt").await.unwrap().as_deref(),
            Some("v1.1.0")
        );
    }

    #[tokio::test]
    async fn test_filesystem_upload_failure_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("file");
        std::fs::write(&not_a_dir, "x").unwrap();

        let storage = FilesystemBlobStorage::new(&not_a_dir);
        let err = storage.upload("latest.txt", "v1").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn test_s3_requires_bucket() {
        let config = S3Config {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
        };
        assert!(S3BlobStorage::new(&config).is_err());
    }
}
