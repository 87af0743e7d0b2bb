//! Provider seam for Compute Engine calls.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::parameter::MissingParameterError;

use super::machine::MachineConfig;
use super::types::InstanceSummary;

/// Future returned by compute provider operations.
pub type ComputeFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Power actions that take an instance name and return no payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstanceAction {
    /// Boots a stopped instance.
    Start,
    /// Shuts an instance down.
    Stop,
    /// Hard-resets a running instance.
    Reset,
}

impl InstanceAction {
    /// Returns the REST verb appended to the instance URL.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for InstanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Minimal interface over the Compute Engine instances and images APIs.
///
/// Each method maps to one remote call (listing follows page tokens
/// internally). Implementations surface provider failures unchanged.
pub trait ComputeApi {
    /// Provider specific error type. Local precondition failures raised by
    /// the facade are converted into it.
    type Error: std::error::Error + From<MissingParameterError> + Send + Sync + 'static;

    /// Lists every instance in the zone.
    fn list_instances<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
    ) -> ComputeFuture<'a, Vec<InstanceSummary>, Self::Error>;

    /// Fetches a single instance by name.
    fn get_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, InstanceSummary, Self::Error>;

    /// Resolves the newest image of a family and returns its `selfLink`.
    fn latest_image<'a>(
        &'a self,
        image_project: &'a str,
        image_family: &'a str,
    ) -> ComputeFuture<'a, String, Self::Error>;

    /// Issues an insert request and returns the operation's target id.
    fn insert_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        config: &'a MachineConfig,
    ) -> ComputeFuture<'a, String, Self::Error>;

    /// Performs a power action on an instance.
    fn perform_action<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
        action: InstanceAction,
    ) -> ComputeFuture<'a, (), Self::Error>;

    /// Deletes an instance.
    fn delete_instance<'a>(
        &'a self,
        project: &'a str,
        zone: &'a str,
        name: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error>;
}
