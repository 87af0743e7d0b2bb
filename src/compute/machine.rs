//! Machine configuration sent with an instance insert request.

use serde::Serialize;

/// Network every new instance is attached to.
pub const DEFAULT_NETWORK: &str = "global/networks/default";

/// OAuth scopes granted to the instance's default service account.
pub const SERVICE_ACCOUNT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/devstorage.read_write",
    "https://www.googleapis.com/auth/logging.write",
];

/// Body of `POST .../instances`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    /// Instance name.
    pub name: String,
    /// Zone-relative machine type URL.
    pub machine_type: String,
    /// Attached disks; the first is the boot disk.
    pub disks: Vec<AttachedDiskConfig>,
    /// Network interfaces.
    pub network_interfaces: Vec<NetworkInterfaceConfig>,
    /// Service accounts and their scopes.
    pub service_accounts: Vec<ServiceAccountConfig>,
}

/// Disk attached at creation time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDiskConfig {
    /// Whether this is the boot disk.
    pub boot: bool,
    /// Whether the disk is deleted with the instance.
    pub auto_delete: bool,
    /// Source used to initialise the disk.
    pub initialize_params: InitializeParams,
}

/// Disk initialisation parameters.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Image `selfLink` the disk is created from.
    pub source_image: String,
}

/// Network interface definition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceConfig {
    /// Network URL.
    pub network: String,
    /// External access configurations.
    pub access_configs: Vec<AccessConfig>,
}

/// External access configuration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AccessConfig {
    /// Access type, always one-to-one NAT here.
    #[serde(rename = "type")]
    pub access_type: String,
    /// Display name.
    pub name: String,
}

/// Service account granted to the instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ServiceAccountConfig {
    /// Account email, `default` for the project's compute account.
    pub email: String,
    /// OAuth scopes.
    pub scopes: Vec<String>,
}

impl MachineConfig {
    /// Builds the standard configuration: boot disk from `source_image` with
    /// auto-delete, default network with external NAT, default service
    /// account with storage read-write and logging write scopes.
    #[must_use]
    pub fn new(name: &str, zone: &str, instance_type: &str, source_image: &str) -> Self {
        Self {
            name: name.to_owned(),
            machine_type: format!("zones/{zone}/machineTypes/{instance_type}"),
            disks: vec![AttachedDiskConfig {
                boot: true,
                auto_delete: true,
                initialize_params: InitializeParams {
                    source_image: source_image.to_owned(),
                },
            }],
            network_interfaces: vec![NetworkInterfaceConfig {
                network: DEFAULT_NETWORK.to_owned(),
                access_configs: vec![AccessConfig {
                    access_type: String::from("ONE_TO_ONE_NAT"),
                    name: String::from("External NAT"),
                }],
            }],
            service_accounts: vec![ServiceAccountConfig {
                email: String::from("default"),
                scopes: SERVICE_ACCOUNT_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
            }],
        }
    }
}
