//! Convenience facades over Google Cloud Compute Engine and Cloud Storage.
//!
//! The crate exposes two independent entry points. [`ComputeFacade`] wraps
//! the instance lifecycle (list, get, create, start, stop, reset, delete)
//! behind a set of immutable defaults. [`StorageFacade`] lists, uploads, and
//! downloads objects in a single bucket and owns the adaptive transfer state
//! used to recover from connection failures on constrained links.
//!
//! Both facades are generic over a provider seam ([`ComputeApi`] and
//! [`StorageApi`]) so the REST clients in [`gce`] and [`gcs`] can be swapped
//! for the scripted doubles in [`test_support`].

pub mod compute;
pub mod config;
pub mod credentials;
pub mod gce;
pub mod gcs;
pub mod parameter;
pub mod storage;
pub mod test_support;

pub use compute::{
    ComputeApi, ComputeDefaults, ComputeFacade, CreatedInstance, InstanceAction, InstanceListing,
    InstanceOverrides, InstanceSummary, MachineConfig,
};
pub use config::{ConfigError, GcpConfig};
pub use credentials::{AccessToken, Credentials, CredentialsError};
pub use gce::{ComputeError, GceClient};
pub use gcs::GcsClient;
pub use parameter::MissingParameterError;
pub use storage::{
    ObjectMetadata, StorageApi, StorageError, StorageFacade, TransferConfig, TransferState,
};
