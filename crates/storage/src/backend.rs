use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use tracing::info;

use feedload_core::config::AwsConfig;
use feedload_core::Config;

use crate::error::StorageError;

/// Where table files live: a local warehouse directory or an S3 bucket.
pub enum WarehouseBackend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl WarehouseBackend {
    /// Select S3 when AWS is configured, otherwise the local warehouse root.
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        if config.aws.is_configured() {
            Ok(WarehouseBackend::S3(S3Backend::new(&config.aws)?))
        } else {
            Ok(WarehouseBackend::Local(LocalBackend::new(&config.warehouse.root)?))
        }
    }

    /// Get the underlying ObjectStore.
    pub fn store(&self) -> &dyn ObjectStore {
        match self {
            WarehouseBackend::Local(b) => b.store.as_ref(),
            WarehouseBackend::S3(b) => b.store.as_ref(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, WarehouseBackend::S3(_))
    }

    /// Key prefix all tables live under ("" for local).
    pub fn prefix(&self) -> &str {
        match self {
            WarehouseBackend::Local(_) => "",
            WarehouseBackend::S3(b) => &b.prefix,
        }
    }

    /// Join a relative key onto the backend prefix.
    pub fn key(&self, relative: &str) -> object_store::path::Path {
        let prefix = self.prefix();
        if prefix.is_empty() {
            object_store::path::Path::from(relative)
        } else {
            object_store::path::Path::from(format!("{}/{}", prefix, relative))
        }
    }
}

/// Local filesystem warehouse.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Warehouse: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
            root: canonical,
        })
    }
}

/// S3 warehouse.
pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl S3Backend {
    pub fn new(aws: &AwsConfig) -> Result<Self, StorageError> {
        let bucket = aws
            .s3_bucket
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("S3_BUCKET not set".into()))?;

        let mut builder = AmazonS3Builder::new().with_region(&aws.region);

        if let Some(ref key) = aws.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = aws.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref token) = aws.session_token {
            builder = builder.with_token(token);
        }

        match aws.endpoint_url.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => {
                // object_store requires an absolute endpoint URL
                let endpoint_url =
                    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                        endpoint.to_string()
                    } else {
                        format!("https://{}", endpoint)
                    };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_endpoint(&endpoint_url)
                    .with_allow_http(endpoint_url.starts_with("http://"));
            }
            _ => {
                builder = builder.with_url(format!("s3://{}", bucket));
            }
        }

        let store = builder.build()?;

        let prefix = aws
            .s3_prefix
            .as_deref()
            .unwrap_or("")
            .trim_matches('/')
            .to_string();

        info!(
            "Warehouse: S3 backend s3://{}/{} (region: {})",
            bucket, prefix, aws.region
        );

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            prefix,
        })
    }
}
