//! Provider seam for Cloud Storage calls.

use std::future::Future;
use std::pin::Pin;

use camino::Utf8Path;
use chrono::{DateTime, Utc};

use super::error::StorageError;
use super::transfer::TransferConfig;

/// Future returned by storage provider operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Metadata reported for one object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ObjectMetadata {
    /// Object name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when reported.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Minimal interface over the Cloud Storage objects API.
pub trait StorageApi {
    /// Lists every object in `bucket` in provider order.
    fn list_objects<'a>(&'a self, bucket: &'a str) -> StorageFuture<'a, Vec<ObjectMetadata>>;

    /// Uploads the file at `source` as object `name`, chunked per `transfer`.
    fn upload_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        source: &'a Utf8Path,
        transfer: TransferConfig,
    ) -> StorageFuture<'a, ()>;

    /// Downloads object `name` to `destination` in a single attempt.
    fn download_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        destination: &'a Utf8Path,
    ) -> StorageFuture<'a, ()>;
}
