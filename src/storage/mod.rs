//! Object storage facade for a single bucket.
//!
//! [`StorageFacade`] owns one provider client and one [`TransferState`].
//! Uploads that fail with a connection error escalate the state to larger
//! chunks and retry exactly once; the escalation is kept for every later
//! upload through the same facade.

mod api;
mod error;
mod path;
mod transfer;

use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::config::GcpConfig;
use crate::credentials::Credentials;
use crate::gcs::{DEFAULT_STORAGE_ENDPOINT, GcsClient};
use crate::gce::DEFAULT_TIMEOUT;
use crate::parameter;

pub use api::{ObjectMetadata, StorageApi, StorageFuture};
pub use error::StorageError;
pub use path::object_path;
pub use transfer::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MULTIPART_SIZE, ESCALATED_CHUNK_SIZE, TransferConfig,
    TransferState,
};

/// Facade over one Cloud Storage bucket.
#[derive(Debug)]
pub struct StorageFacade<C> {
    bucket_name: String,
    client: C,
    transfer: TransferState,
}

impl StorageFacade<GcsClient> {
    /// Connects to the public Cloud Storage endpoint. Without explicit
    /// credentials the token is discovered from the ambient environment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the bucket name is blank or no token
    /// can be obtained.
    pub async fn connect(
        bucket_name: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self, StorageError> {
        let bucket = bucket_name.into();
        parameter::require("bucket_name", &bucket)?;
        let client = GcsClient::connect(
            DEFAULT_STORAGE_ENDPOINT,
            &credentials.unwrap_or_default(),
            DEFAULT_TIMEOUT,
        )
        .await?;
        Self::new(bucket, client)
    }

    /// Connects using layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] when the configuration is invalid or
    /// names no bucket, otherwise [`StorageError`] when no token can be
    /// obtained.
    pub async fn from_config(config: &GcpConfig) -> Result<Self, StorageError> {
        config.validate()?;
        let bucket = config.require_bucket()?.to_owned();
        let client = GcsClient::from_config(config).await?;
        Self::new(bucket, client)
    }
}

impl<C: StorageApi> StorageFacade<C> {
    /// Wraps an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingParameter`] when the bucket name is
    /// blank.
    pub fn new(bucket_name: impl Into<String>, client: C) -> Result<Self, StorageError> {
        let requested = bucket_name.into();
        Ok(Self {
            bucket_name: parameter::require("bucket_name", &requested)?.to_owned(),
            client,
            transfer: TransferState::Default,
        })
    }

    /// Returns the bucket this facade operates on.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Returns the provider client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the current upload escalation state.
    #[must_use]
    pub const fn transfer_state(&self) -> TransferState {
        self.transfer
    }

    /// Lists name, size, and last update time of every object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BucketNotFound`] when the bucket is missing,
    /// otherwise the provider error.
    pub async fn list_object_metadata(&self) -> Result<Vec<ObjectMetadata>, StorageError> {
        let objects = self.client.list_objects(&self.bucket_name).await?;
        info!(bucket = %self.bucket_name, count = objects.len(), "listed objects");
        Ok(objects)
    }

    /// Lists the names of every object.
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_object_metadata`].
    pub async fn list_object_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .list_object_metadata()
            .await?
            .into_iter()
            .map(|object| object.name)
            .collect())
    }

    /// Downloads object `name` into `dest_dir` and returns the local path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the object is missing or the transfer
    /// cannot complete. Nothing is retried.
    pub async fn download(&self, name: &str, dest_dir: &str) -> Result<Utf8PathBuf, StorageError> {
        let destination = object_path("dest_dir", dest_dir, name)?;
        info!(bucket = %self.bucket_name, object = name, destination = %destination, "downloading object");
        self.client
            .download_file(&self.bucket_name, name, &destination)
            .await?;
        info!(bucket = %self.bucket_name, object = name, destination = %destination, "downloaded object");
        Ok(destination)
    }

    /// Uploads `src_dir/name` as object `name` and returns the local path.
    ///
    /// Every connection failure escalates to larger chunks (a no-op once
    /// escalated) and retries once. Other failures, and any failure of the
    /// retry, propagate.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the upload cannot complete.
    pub async fn upload(&mut self, name: &str, src_dir: &str) -> Result<Utf8PathBuf, StorageError> {
        let source = object_path("src_dir", src_dir, name)?;
        info!(bucket = %self.bucket_name, object = name, source = %source, "uploading object");

        let first = self
            .client
            .upload_file(&self.bucket_name, name, &source, self.transfer.config())
            .await;

        match first {
            Ok(()) => {}
            Err(err) if err.is_connection_failure() => {
                self.transfer = TransferState::Escalated;
                let transfer = self.transfer.config();
                warn!(
                    bucket = %self.bucket_name,
                    object = name,
                    error = %err,
                    chunk_size = transfer.chunk_size,
                    "upload connection failed; retrying with enlarged chunk size"
                );
                self.client
                    .upload_file(&self.bucket_name, name, &source, transfer)
                    .await?;
            }
            Err(err) => return Err(err),
        }

        info!(bucket = %self.bucket_name, object = name, source = %source, "uploaded object");
        Ok(source)
    }
}
