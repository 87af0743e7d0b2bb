//! Compute Engine REST response models.

use serde::Deserialize;

use crate::compute::InstanceSummary;

/// One page of `instances.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InstanceList {
    #[serde(default)]
    pub(super) items: Vec<GceInstance>,
    pub(super) next_page_token: Option<String>,
}

/// Instance fields the facade reports.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GceInstance {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) status: String,
    pub(super) machine_type: String,
}

impl From<GceInstance> for InstanceSummary {
    fn from(value: GceInstance) -> Self {
        Self {
            id: value.id,
            name: value.name,
            status: value.status,
            machine_type: value.machine_type,
        }
    }
}

/// Image returned by `images.getFromFamily`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GceImage {
    pub(super) self_link: String,
}

/// Zone operation returned by mutating calls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GceOperation {
    #[serde(default)]
    pub(super) target_id: Option<String>,
    #[serde(default)]
    pub(super) name: Option<String>,
}
