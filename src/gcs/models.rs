//! Cloud Storage JSON API response models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::storage::{ObjectMetadata, StorageError};

/// One page of `objects.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ObjectList {
    #[serde(default)]
    pub(super) items: Vec<GcsObject>,
    pub(super) next_page_token: Option<String>,
}

/// Object resource; `size` is a decimal string in the JSON API.
#[derive(Debug, Deserialize)]
pub(super) struct GcsObject {
    pub(super) name: String,
    #[serde(default)]
    pub(super) size: Option<String>,
    #[serde(default)]
    pub(super) updated: Option<DateTime<Utc>>,
}

impl TryFrom<GcsObject> for ObjectMetadata {
    type Error = StorageError;

    fn try_from(value: GcsObject) -> Result<Self, Self::Error> {
        let size = match value.size.as_deref() {
            None => 0,
            Some(text) => text.parse::<u64>().map_err(|err| StorageError::Decode {
                message: format!("object {} has invalid size {text:?}: {err}", value.name),
            })?,
        };
        Ok(Self {
            name: value.name,
            size,
            last_updated: value.updated,
        })
    }
}
