//! Test support utilities shared across unit and integration tests.
//!
//! The scripted providers record every call and answer from queued results,
//! so facade behaviour can be asserted without network access.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::{Mutex, MutexGuard};

use crate::compute::{ComputeApi, ComputeFuture, InstanceAction, InstanceSummary, MachineConfig};
use crate::gce::ComputeError;
use crate::storage::{ObjectMetadata, StorageApi, StorageError, StorageFuture, TransferConfig};

/// Target id returned by [`ScriptedComputeApi`] unless overridden.
pub const SCRIPTED_TARGET_ID: &str = "7400000000000000001";

fn lock<T>(mutex: &StdMutex<T>) -> StdMutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call recorded by [`ScriptedComputeApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ComputeCall {
    /// `list_instances(project, zone)`.
    List {
        /// Project argument.
        project: String,
        /// Zone argument.
        zone: String,
    },
    /// `get_instance(project, zone, name)`.
    Get {
        /// Project argument.
        project: String,
        /// Zone argument.
        zone: String,
        /// Instance name.
        name: String,
    },
    /// `latest_image(image_project, image_family)`.
    LatestImage {
        /// Image project argument.
        image_project: String,
        /// Image family argument.
        image_family: String,
    },
    /// `insert_instance(project, zone, config)`.
    Insert {
        /// Project argument.
        project: String,
        /// Zone argument.
        zone: String,
        /// Machine configuration sent.
        config: MachineConfig,
    },
    /// `perform_action(project, zone, name, action)`.
    Action {
        /// Project argument.
        project: String,
        /// Zone argument.
        zone: String,
        /// Instance name.
        name: String,
        /// Action performed.
        action: InstanceAction,
    },
    /// `delete_instance(project, zone, name)`.
    Delete {
        /// Project argument.
        project: String,
        /// Zone argument.
        zone: String,
        /// Instance name.
        name: String,
    },
}

#[derive(Debug)]
struct ComputeScript {
    instances: Vec<InstanceSummary>,
    target_id: String,
    failures: VecDeque<ComputeError>,
    calls: Vec<ComputeCall>,
}

/// Scripted [`ComputeApi`] that records calls and fails on demand.
///
/// Clones share state, so a facade built by `adopt` reports into the same
/// call log.
#[derive(Clone, Debug)]
pub struct ScriptedComputeApi {
    state: Arc<StdMutex<ComputeScript>>,
}

impl Default for ScriptedComputeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedComputeApi {
    /// Creates a provider with no instances.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(StdMutex::new(ComputeScript {
                instances: Vec::new(),
                target_id: SCRIPTED_TARGET_ID.to_owned(),
                failures: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Replaces the instances returned by list and get calls.
    #[must_use]
    pub fn with_instances(self, instances: Vec<InstanceSummary>) -> Self {
        lock(&self.state).instances = instances;
        self
    }

    /// Sets the target id returned by inserts.
    #[must_use]
    pub fn with_target_id(self, target_id: impl Into<String>) -> Self {
        lock(&self.state).target_id = target_id.into();
        self
    }

    /// Queues an error returned by the next call.
    pub fn fail_next(&self, error: ComputeError) {
        lock(&self.state).failures.push_back(error);
    }

    /// Returns a snapshot of every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ComputeCall> {
        lock(&self.state).calls.clone()
    }

    fn record(&self, call: ComputeCall) -> Result<(), ComputeError> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state.failures.pop_front().map_or(Ok(()), Err)
    }
}

/// Builds an instance summary with a `RUNNING` status.
#[must_use]
pub fn running_instance(id: &str, name: &str) -> InstanceSummary {
    InstanceSummary {
        id: id.to_owned(),
        name: name.to_owned(),
        status: String::from("RUNNING"),
        machine_type: String::from("zones/us-east1-b/machineTypes/e2-small"),
    }
}

impl ComputeApi for ScriptedComputeApi {
    type Error = ComputeError;

    fn list_instances<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
    ) -> ComputeFuture<'a, Vec<InstanceSummary>, Self::Error> {
        let result = self
            .record(ComputeCall::List {
                project: project.to_owned(),
                zone: zone.to_owned(),
            })
            .map(|()| lock(&self.state).instances.clone());
        Box::pin(async move { result })
    }

    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, InstanceSummary, Self::Error> {
        let result = self
            .record(ComputeCall::Get {
                project: project.to_owned(),
                zone: zone.to_owned(),
                name: name.to_owned(),
            })
            .and_then(|()| {
                lock(&self.state)
                    .instances
                    .iter()
                    .find(|instance| instance.name == name)
                    .cloned()
                    .ok_or_else(|| ComputeError::Api {
                        status: 404,
                        message: format!("instance {name} not found"),
                    })
            });
        Box::pin(async move { result })
    }

    fn latest_image<'a>(
        &'a self,
        image_project: &'a str,
        image_family: &'a str,
    ) -> ComputeFuture<'a, String, Self::Error> {
        let result = self
            .record(ComputeCall::LatestImage {
                image_project: image_project.to_owned(),
                image_family: image_family.to_owned(),
            })
            .map(|()| format!("projects/{image_project}/global/images/{image_family}-v1"));
        Box::pin(async move { result })
    }

    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        config: &'a MachineConfig,
    ) -> ComputeFuture<'a, String, Self::Error> {
        let result = self
            .record(ComputeCall::Insert {
                project: project.to_owned(),
                zone: zone.to_owned(),
                config: config.clone(),
            })
            .map(|()| lock(&self.state).target_id.clone());
        Box::pin(async move { result })
    }

    fn perform_action<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
        action: InstanceAction,
    ) -> ComputeFuture<'a, (), Self::Error> {
        let result = self.record(ComputeCall::Action {
            project: project.to_owned(),
            zone: zone.to_owned(),
            name: name.to_owned(),
            action,
        });
        Box::pin(async move { result })
    }

    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error> {
        let result = self.record(ComputeCall::Delete {
            project: project.to_owned(),
            zone: zone.to_owned(),
            name: name.to_owned(),
        });
        Box::pin(async move { result })
    }
}

/// An upload recorded by [`ScriptedStorageApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadCall {
    /// Bucket argument.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Local source path.
    pub source: Utf8PathBuf,
    /// Chunking in effect for this attempt.
    pub transfer: TransferConfig,
}

/// A download recorded by [`ScriptedStorageApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DownloadCall {
    /// Bucket argument.
    pub bucket: String,
    /// Object name.
    pub name: String,
    /// Local destination path.
    pub destination: Utf8PathBuf,
}

#[derive(Debug, Default)]
struct StorageScript {
    objects: Vec<ObjectMetadata>,
    list_failure: Option<StorageError>,
    upload_results: VecDeque<Result<(), StorageError>>,
    download_results: VecDeque<Result<(), StorageError>>,
    uploads: Vec<UploadCall>,
    downloads: Vec<DownloadCall>,
}

/// Scripted [`StorageApi`]. Uploads and downloads succeed unless a result
/// has been queued for them.
#[derive(Clone, Debug, Default)]
pub struct ScriptedStorageApi {
    state: Arc<StdMutex<StorageScript>>,
}

impl ScriptedStorageApi {
    /// Creates a provider for an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the objects returned by listing.
    #[must_use]
    pub fn with_objects(self, objects: Vec<ObjectMetadata>) -> Self {
        lock(&self.state).objects = objects;
        self
    }

    /// Makes every listing fail with `error`.
    pub fn fail_listing(&self, error: StorageError) {
        lock(&self.state).list_failure = Some(error);
    }

    /// Queues the outcome of the next upload attempt.
    pub fn push_upload_result(&self, result: Result<(), StorageError>) {
        lock(&self.state).upload_results.push_back(result);
    }

    /// Queues the outcome of the next download attempt.
    pub fn push_download_result(&self, result: Result<(), StorageError>) {
        lock(&self.state).download_results.push_back(result);
    }

    /// Returns every upload attempt recorded so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadCall> {
        lock(&self.state).uploads.clone()
    }

    /// Returns every download attempt recorded so far.
    #[must_use]
    pub fn downloads(&self) -> Vec<DownloadCall> {
        lock(&self.state).downloads.clone()
    }
}

/// Builds object metadata without a modification time.
#[must_use]
pub fn object(name: &str, size: u64) -> ObjectMetadata {
    ObjectMetadata {
        name: name.to_owned(),
        size,
        last_updated: None,
    }
}

/// Builds the error a dropped connection produces.
#[must_use]
pub fn connection_reset() -> StorageError {
    StorageError::Connection {
        message: String::from("connection reset by peer"),
    }
}

impl StorageApi for ScriptedStorageApi {
    fn list_objects<'a>(&'a self, _bucket: &'a str) -> StorageFuture<'a, Vec<ObjectMetadata>> {
        let state = lock(&self.state);
        let result = state
            .list_failure
            .clone()
            .map_or_else(|| Ok(state.objects.clone()), Err);
        drop(state);
        Box::pin(async move { result })
    }

    fn upload_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        source: &'a Utf8Path,
        transfer: TransferConfig,
    ) -> StorageFuture<'a, ()> {
        let mut state = lock(&self.state);
        state.uploads.push(UploadCall {
            bucket: bucket.to_owned(),
            name: name.to_owned(),
            source: source.to_owned(),
            transfer,
        });
        let result = state.upload_results.pop_front().unwrap_or(Ok(()));
        drop(state);
        Box::pin(async move { result })
    }

    fn download_file<'a>(
        &'a self,
        bucket: &'a str,
        name: &'a str,
        destination: &'a Utf8Path,
    ) -> StorageFuture<'a, ()> {
        let mut state = lock(&self.state);
        state.downloads.push(DownloadCall {
            bucket: bucket.to_owned(),
            name: name.to_owned(),
            destination: destination.to_owned(),
        });
        let result = state.download_results.pop_front().unwrap_or(Ok(()));
        drop(state);
        Box::pin(async move { result })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let changes: Vec<(&str, Option<&str>)> =
            pairs.iter().map(|(key, value)| (*key, Some(*value))).collect();
        Self::apply(&changes).await
    }

    /// Sets (`Some`) or removes (`None`) environment variables while holding
    /// a global mutex.
    pub async fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                changes.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(changes.len());
        for (key, value) in changes {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(text) => env::set_var(key, text),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
