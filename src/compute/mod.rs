//! Instance lifecycle facade.
//!
//! [`ComputeFacade`] resolves each call's parameters against an immutable
//! set of [`ComputeDefaults`] and forwards one request to a [`ComputeApi`].
//! Missing parameters are reported before any network traffic. Creating an
//! instance never rewrites the stored defaults; the returned
//! [`CreatedInstance`] can be promoted with [`ComputeFacade::adopt`].

mod api;
mod machine;
mod types;

use tracing::info;

use crate::parameter::{self, MissingParameterError};

pub use api::{ComputeApi, ComputeFuture, InstanceAction};
pub use machine::{
    AccessConfig, AttachedDiskConfig, DEFAULT_NETWORK, InitializeParams, MachineConfig,
    NetworkInterfaceConfig, SERVICE_ACCOUNT_SCOPES, ServiceAccountConfig,
};
pub use types::{
    ComputeDefaults, CreatedInstance, InstanceListing, InstanceOverrides, InstanceSummary,
};

/// Facade over the Compute Engine instance lifecycle.
#[derive(Clone, Debug)]
pub struct ComputeFacade<A> {
    api: A,
    defaults: ComputeDefaults,
}

impl<A: ComputeApi> ComputeFacade<A> {
    /// Creates a facade that forwards calls to `api`.
    #[must_use]
    pub const fn new(api: A, defaults: ComputeDefaults) -> Self {
        Self { api, defaults }
    }

    /// Returns the stored defaults.
    #[must_use]
    pub const fn defaults(&self) -> &ComputeDefaults {
        &self.defaults
    }

    /// Returns the provider client.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Builds a facade whose defaults are the values resolved by a previous
    /// `create_instance` call. Project and zone are kept.
    #[must_use]
    pub fn adopt(&self, created: &CreatedInstance) -> Self
    where
        A: Clone,
    {
        let defaults = ComputeDefaults {
            project: self.defaults.project.clone(),
            zone: self.defaults.zone.clone(),
            image_family: Some(created.image_family.clone()),
            image_project: Some(created.image_project.clone()),
            instance_type: Some(created.instance_type.clone()),
            instance_name: Some(created.instance_name.clone()),
        };
        Self::new(self.api.clone(), defaults)
    }

    /// Lists every instance in the configured project and zone.
    ///
    /// A zone without instances yields [`InstanceListing::Empty`].
    ///
    /// # Errors
    ///
    /// Returns the provider error when the request fails, or a missing
    /// parameter error when project or zone are blank.
    pub async fn list_instances(&self) -> Result<InstanceListing, A::Error> {
        let (project, zone) = self.placement()?;
        info!(project, zone, "listing instances");

        let listing = InstanceListing::from_instances(self.api.list_instances(project, zone).await?);
        match &listing {
            InstanceListing::Empty => info!(project, zone, "no instances"),
            InstanceListing::Instances(instances) => {
                for instance in instances {
                    info!(
                        id = %instance.id,
                        name = %instance.name,
                        status = %instance.status,
                        machine_type = %instance.machine_type,
                        "instance"
                    );
                }
            }
        }
        Ok(listing)
    }

    /// Creates an instance from the latest image in a family.
    ///
    /// Each override falls back to the stored default. The machine gets a
    /// boot disk from the resolved image, the default network with external
    /// NAT, and the default service account.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error naming the first unresolved field
    /// (`image_project`, `image_family`, `instance_type`, `instance_name`)
    /// before any request is sent; otherwise the provider error.
    pub async fn create_instance(
        &self,
        overrides: InstanceOverrides,
    ) -> Result<CreatedInstance, A::Error> {
        let (project, zone) = self.placement()?;
        let image_project = parameter::resolve(
            "image_project",
            overrides.image_project.as_deref(),
            self.defaults.image_project.as_deref(),
        )?;
        let image_family = parameter::resolve(
            "image_family",
            overrides.image_family.as_deref(),
            self.defaults.image_family.as_deref(),
        )?;
        let instance_type = parameter::resolve(
            "instance_type",
            overrides.instance_type.as_deref(),
            self.defaults.instance_type.as_deref(),
        )?;
        let instance_name = parameter::resolve(
            "instance_name",
            overrides.instance_name.as_deref(),
            self.defaults.instance_name.as_deref(),
        )?;

        info!(
            project,
            zone,
            instance = instance_name,
            instance_type,
            image_family,
            "creating instance"
        );

        let source_image = self.api.latest_image(image_project, image_family).await?;
        let config = MachineConfig::new(instance_name, zone, instance_type, &source_image);
        let target_id = self.api.insert_instance(project, zone, &config).await?;

        info!(instance = instance_name, target_id = %target_id, "instance created");

        Ok(CreatedInstance {
            target_id,
            image_project: image_project.to_owned(),
            image_family: image_family.to_owned(),
            instance_type: instance_type.to_owned(),
            instance_name: instance_name.to_owned(),
        })
    }

    /// Fetches a single instance.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error when no instance name is available,
    /// otherwise the provider error.
    pub async fn get_instance(
        &self,
        instance_name: Option<&str>,
    ) -> Result<InstanceSummary, A::Error> {
        let (project, zone) = self.placement()?;
        let name = self.instance_name(instance_name)?;
        let instance = self.api.get_instance(project, zone, name).await?;
        info!(
            id = %instance.id,
            name = %instance.name,
            status = %instance.status,
            machine_type = %instance.machine_type,
            "instance"
        );
        Ok(instance)
    }

    /// Starts an instance.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error when no instance name is available,
    /// otherwise the provider error.
    pub async fn start_instance(&self, instance_name: Option<&str>) -> Result<(), A::Error> {
        self.act(instance_name, InstanceAction::Start).await
    }

    /// Stops an instance.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error when no instance name is available,
    /// otherwise the provider error.
    pub async fn stop_instance(&self, instance_name: Option<&str>) -> Result<(), A::Error> {
        self.act(instance_name, InstanceAction::Stop).await
    }

    /// Resets an instance.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error when no instance name is available,
    /// otherwise the provider error.
    pub async fn reset_instance(&self, instance_name: Option<&str>) -> Result<(), A::Error> {
        self.act(instance_name, InstanceAction::Reset).await
    }

    /// Deletes an instance.
    ///
    /// # Errors
    ///
    /// Returns a missing parameter error when no instance name is available,
    /// otherwise the provider error.
    pub async fn delete_instance(&self, instance_name: Option<&str>) -> Result<(), A::Error> {
        let (project, zone) = self.placement()?;
        let name = self.instance_name(instance_name)?;
        info!(project, zone, instance = name, "deleting instance");
        self.api.delete_instance(project, zone, name).await
    }

    async fn act(&self, instance_name: Option<&str>, action: InstanceAction) -> Result<(), A::Error> {
        let (project, zone) = self.placement()?;
        let name = self.instance_name(instance_name)?;
        info!(project, zone, instance = name, %action, "instance action");
        self.api.perform_action(project, zone, name, action).await
    }

    fn placement(&self) -> Result<(&str, &str), MissingParameterError> {
        Ok((
            parameter::require("project", &self.defaults.project)?,
            parameter::require("zone", &self.defaults.zone)?,
        ))
    }

    fn instance_name<'a>(
        &'a self,
        explicit: Option<&'a str>,
    ) -> Result<&'a str, MissingParameterError> {
        parameter::resolve(
            "instance_name",
            explicit,
            self.defaults.instance_name.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests;
