//! Values exchanged with the compute facade.

/// Defaults applied when a call omits a parameter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ComputeDefaults {
    /// Project that owns the instances.
    pub project: String,
    /// Zone the instances live in.
    pub zone: String,
    /// Image family used to pick a boot image.
    pub image_family: Option<String>,
    /// Project hosting the image family.
    pub image_project: Option<String>,
    /// Machine type for new instances.
    pub instance_type: Option<String>,
    /// Instance name used by lifecycle calls.
    pub instance_name: Option<String>,
}

impl ComputeDefaults {
    /// Creates defaults scoped to a project and zone, trimming both.
    #[must_use]
    pub fn new(project: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            project: project.into().trim().to_owned(),
            zone: zone.into().trim().to_owned(),
            ..Self::default()
        }
    }

    /// Sets the default image family.
    #[must_use]
    pub fn image_family(mut self, value: impl Into<String>) -> Self {
        self.image_family = Some(value.into());
        self
    }

    /// Sets the default image project.
    #[must_use]
    pub fn image_project(mut self, value: impl Into<String>) -> Self {
        self.image_project = Some(value.into());
        self
    }

    /// Sets the default machine type.
    #[must_use]
    pub fn instance_type(mut self, value: impl Into<String>) -> Self {
        self.instance_type = Some(value.into());
        self
    }

    /// Sets the default instance name.
    #[must_use]
    pub fn instance_name(mut self, value: impl Into<String>) -> Self {
        self.instance_name = Some(value.into());
        self
    }
}

/// Per-call arguments to `create_instance`; `None` falls back to defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstanceOverrides {
    /// Project hosting the image family.
    pub image_project: Option<String>,
    /// Image family.
    pub image_family: Option<String>,
    /// Machine type.
    pub instance_type: Option<String>,
    /// Instance name.
    pub instance_name: Option<String>,
}

/// Outcome of a successful `create_instance` call.
///
/// Carries the resolved parameters so callers can promote them to defaults
/// explicitly with `ComputeFacade::adopt`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedInstance {
    /// `targetId` of the insert operation.
    pub target_id: String,
    /// Image project used.
    pub image_project: String,
    /// Image family used.
    pub image_family: String,
    /// Machine type used.
    pub instance_type: String,
    /// Instance name used.
    pub instance_name: String,
}

/// Summary of an instance as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSummary {
    /// Provider assigned identifier.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Lifecycle status (for example `RUNNING`).
    pub status: String,
    /// Machine type URL.
    pub machine_type: String,
}

/// Result of listing instances in a zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstanceListing {
    /// The zone has no instances.
    Empty,
    /// Instances in listing order.
    Instances(Vec<InstanceSummary>),
}

impl InstanceListing {
    /// Wraps listed instances, mapping an empty list to [`Self::Empty`].
    #[must_use]
    pub fn from_instances(instances: Vec<InstanceSummary>) -> Self {
        if instances.is_empty() {
            Self::Empty
        } else {
            Self::Instances(instances)
        }
    }

    /// Returns `true` when no instances were found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the listed instances, empty when none were found.
    #[must_use]
    pub fn into_instances(self) -> Vec<InstanceSummary> {
        match self {
            Self::Empty => Vec::new(),
            Self::Instances(instances) => instances,
        }
    }
}
