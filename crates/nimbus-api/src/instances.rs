//! Compute instance resources: request options, wire types, and calls.
//!
//! Request option structs are immutable value objects built once per
//! invocation. They must pass [`CreateInstanceOpts::validate`] (or the
//! delete equivalent) before being dispatched, and validation reports every
//! failing field, not just the first.
//!
//! The enum flags (`VolumeSource`, `VolumeType`, `InterfaceType`,
//! `FloatingIpSource`) are closed sets: they derive `clap::ValueEnum` so
//! unknown spellings are rejected at parse time with the allowed values in
//! the usage error, and their serde spelling is the wire spelling.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::tasks::TaskList;
use crate::validation::{ValidationBuilder, ValidationError, ValidationErrors};

/// Largest volume the control plane will provision, in GiB.
pub const MAX_VOLUME_SIZE_GIB: u64 = 4096;

/// Where a new instance volume gets its contents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeSource {
    /// Blank volume of the requested size.
    NewVolume,
    /// Volume initialized from an image.
    Image,
    /// Volume restored from a snapshot.
    Snapshot,
    /// Attach an already existing volume.
    ExistingVolume,
}

/// Performance class of a volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeType {
    /// General-purpose storage; the default when no type is supplied.
    #[default]
    Standard,
    /// High-IOPS SSD storage.
    Ssd,
    /// Infrequent-access storage.
    Cold,
    /// Highest-throughput storage.
    Ultra,
}

/// How an instance interface attaches to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    /// Publicly routable interface.
    External,
    /// Interface in a specific subnet.
    Subnet,
    /// Interface in any subnet of a network.
    AnySubnet,
}

/// Where a floating IP for a subnet interface comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FloatingIpSource {
    /// Allocate a fresh floating IP.
    New,
    /// Attach an existing floating IP by ID.
    Existing,
}

impl fmt::Display for VolumeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NewVolume => "new-volume",
            Self::Image => "image",
            Self::Snapshot => "snapshot",
            Self::ExistingVolume => "existing-volume",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Standard => "standard",
            Self::Ssd => "ssd",
            Self::Cold => "cold",
            Self::Ultra => "ultra",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::External => "external",
            Self::Subnet => "subnet",
            Self::AnySubnet => "any-subnet",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for FloatingIpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Existing => "existing",
        };
        write!(f, "{s}")
    }
}

/// One volume to create or attach with an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolumeOpts {
    /// Where the volume contents come from.
    pub source: VolumeSource,
    /// Boot order position; 0 is the boot volume.
    pub boot_index: i32,
    /// Volume size in GiB; required for `new-volume`.
    #[serde(skip_serializing_if = "is_zero", default)]
    pub size: u64,
    /// Performance class.
    pub type_name: VolumeType,
    /// Optional display name.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    /// Source image; required when `source` is `image`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub image_id: String,
    /// Source snapshot; required when `source` is `snapshot`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub snapshot_id: String,
    /// Existing volume; required when `source` is `existing-volume`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub volume_id: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl CreateVolumeOpts {
    /// Validate source-specific requirements, collecting every failure.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut builder = ValidationBuilder::new()
            .require_when(
                self.source == VolumeSource::Image,
                "image_id",
                &self.image_id,
                "when volume source is 'image'",
            )
            .require_when(
                self.source == VolumeSource::Snapshot,
                "snapshot_id",
                &self.snapshot_id,
                "when volume source is 'snapshot'",
            )
            .require_when(
                self.source == VolumeSource::ExistingVolume,
                "volume_id",
                &self.volume_id,
                "when volume source is 'existing-volume'",
            );
        if self.source == VolumeSource::NewVolume {
            builder = builder.require_in_range("size", self.size, 1, MAX_VOLUME_SIZE_GIB);
        }
        builder.finish()
    }
}

/// Floating IP sub-options for a subnet-scoped interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIpOpts {
    /// Where the floating IP comes from.
    pub source: FloatingIpSource,
    /// Existing floating IP ID; required when `source` is `existing`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub existing_floating_id: String,
}

impl FloatingIpOpts {
    /// Validate the source/ID pairing.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationBuilder::new()
            .require_when(
                self.source == FloatingIpSource::Existing,
                "existing_floating_id",
                &self.existing_floating_id,
                "when floating IP source is 'existing'",
            )
            .finish()
    }
}

/// One network interface for a new instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInterfaceOpts {
    /// How the interface attaches to the network.
    #[serde(rename = "type")]
    pub interface_type: InterfaceType,
    /// Network to attach to; required for `subnet` and `any-subnet`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub network_id: String,
    /// Subnet to attach to; required for `subnet`.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub subnet_id: String,
    /// Floating IP attachment; only meaningful for `subnet` interfaces.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub floating_ip: Option<FloatingIpOpts>,
}

impl CreateInterfaceOpts {
    /// Validate type-specific requirements, collecting every failure.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut builder = ValidationBuilder::new()
            .require_when(
                matches!(
                    self.interface_type,
                    InterfaceType::Subnet | InterfaceType::AnySubnet
                ),
                "network_id",
                &self.network_id,
                &format!("for '{}' interfaces", self.interface_type),
            )
            .require_when(
                self.interface_type == InterfaceType::Subnet,
                "subnet_id",
                &self.subnet_id,
                "for 'subnet' interfaces",
            );
        if self.floating_ip.is_some() && self.interface_type != InterfaceType::Subnet {
            builder = builder.push(ValidationError::invalid_format(
                "floating_ip",
                "no floating IP outside 'subnet' interfaces",
                self.interface_type.to_string(),
            ));
        }
        if let Some(fip) = &self.floating_ip {
            builder = builder.nested("floating_ip", fip.validate());
        }
        builder.finish()
    }
}

/// A reference to another resource by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemId {
    /// Resource identifier.
    pub id: String,
}

/// Options for creating one or more instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceOpts {
    /// Flavor name, e.g. `g1-small`.
    pub flavor: String,
    /// Explicit instance names.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub names: Vec<String>,
    /// Name templates expanded server-side.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub name_templates: Vec<String>,
    /// Volumes, in boot order.
    pub volumes: Vec<CreateVolumeOpts>,
    /// Network interfaces.
    pub interfaces: Vec<CreateInterfaceOpts>,
    /// Security groups to attach.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security_groups: Vec<ItemId>,
    /// SSH keypair name.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub keypair_name: String,
    /// Login password.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub password: String,
    /// Login username.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub username: String,
    /// Base64-encoded user data payload.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub user_data: String,
    /// Free-form metadata tags.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, String>,
}

impl CreateInstanceOpts {
    /// Validate the whole request, collecting every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut builder = ValidationBuilder::new().require_not_empty("flavor", &self.flavor);

        if self.names.is_empty() && self.name_templates.is_empty() {
            builder = builder.push(ValidationError::missing(
                "names",
                "(either a name or a name template must be supplied)",
            ));
        }
        if self.volumes.is_empty() {
            builder = builder.push(ValidationError::empty("volumes"));
        }
        if self.interfaces.is_empty() {
            builder = builder.push(ValidationError::empty("interfaces"));
        }
        for (idx, volume) in self.volumes.iter().enumerate() {
            builder = builder.nested(&format!("volumes[{idx}]"), volume.validate());
        }
        for (idx, interface) in self.interfaces.iter().enumerate() {
            builder = builder.nested(&format!("interfaces[{idx}]"), interface.validate());
        }
        builder.finish()
    }
}

/// Options for deleting an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteInstanceOpts {
    /// Volumes to delete together with the instance.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub volumes: Vec<String>,
    /// Delete every floating IP attached to the instance.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub delete_floating_ips: bool,
    /// Specific floating IPs to delete.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub floating_ips: Vec<String>,
}

impl DeleteInstanceOpts {
    /// Validate the delete options.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationBuilder::new()
            .forbid_together(
                self.delete_floating_ips && !self.floating_ips.is_empty(),
                "floating_ips",
                "delete_floating_ips",
            )
            .finish()
    }
}

/// Server-side list filters for instances.
#[derive(Debug, Clone, Default)]
pub struct ListInstancesParams {
    /// Exclude instances in the named security group.
    pub exclude_security_group: Option<String>,
    /// Only instances able to take a floating IP.
    pub available_floating: bool,
}

/// An instance as returned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Instance identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Flavor name.
    pub flavor: String,
    /// Provisioning status, e.g. `ACTIVE`.
    pub status: String,
    /// Hypervisor power state, e.g. `running`.
    #[serde(default)]
    pub vm_state: String,
    /// Creation timestamp as reported by the API.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One network interface attached to an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInterface {
    /// Port identifier.
    pub port_id: String,
    /// Network the interface is attached to.
    pub network_id: String,
    /// Assigned IP address.
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// A security group attached to an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedSecurityGroup {
    /// Security group name.
    pub name: String,
}

/// Standard paged list envelope used by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    /// Total result count.
    pub count: usize,
    /// Results for this page.
    pub results: Vec<T>,
}

/// List instances, with optional server-side filters.
pub async fn list(client: &ApiClient, params: &ListInstancesParams) -> ApiResult<Vec<Instance>> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(group) = &params.exclude_security_group {
        query.push(("exclude_security_group", group.clone()));
    }
    if params.available_floating {
        query.push(("available_floating", "true".into()));
    }
    let url = client.url("v1", "instances", "")?;
    let page: Paged<Instance> = client.get_json_query(&url, &query).await?;
    Ok(page.results)
}

/// Fetch one instance by ID.
pub async fn get(client: &ApiClient, instance_id: &str) -> ApiResult<Instance> {
    client
        .get_json(&client.url("v1", "instances", instance_id)?)
        .await
}

/// Create instances. Returns the tasks the control plane spawned.
///
/// The caller is expected to have run [`CreateInstanceOpts::validate`]
/// first; the control plane validates again server-side regardless.
pub async fn create(client: &ApiClient, opts: &CreateInstanceOpts) -> ApiResult<TaskList> {
    client
        .post_json(&client.url("v2", "instances", "")?, opts)
        .await
}

/// Delete an instance. Returns the tasks the control plane spawned.
pub async fn delete(
    client: &ApiClient,
    instance_id: &str,
    opts: &DeleteInstanceOpts,
) -> ApiResult<TaskList> {
    client
        .delete_json(&client.url("v1", "instances", instance_id)?, opts)
        .await
}

/// List the interfaces attached to an instance.
pub async fn list_interfaces(
    client: &ApiClient,
    instance_id: &str,
) -> ApiResult<Vec<InstanceInterface>> {
    let url = client.url("v1", "instances", &format!("{instance_id}/interfaces"))?;
    let page: Paged<InstanceInterface> = client.get_json(&url).await?;
    Ok(page.results)
}

/// List the security groups attached to an instance.
pub async fn list_security_groups(
    client: &ApiClient,
    instance_id: &str,
) -> ApiResult<Vec<AttachedSecurityGroup>> {
    let url = client.url("v1", "instances", &format!("{instance_id}/securitygroups"))?;
    let page: Paged<AttachedSecurityGroup> = client.get_json(&url).await?;
    Ok(page.results)
}

/// Request body for security group attach/detach.
#[derive(Debug, Clone, Serialize)]
struct SecurityGroupBody<'a> {
    name: &'a str,
}

/// Attach a security group to an instance by name.
pub async fn assign_security_group(
    client: &ApiClient,
    instance_id: &str,
    name: &str,
) -> ApiResult<()> {
    let url = client.url("v1", "instances", &format!("{instance_id}/addsecuritygroup"))?;
    client.post_empty(&url, &SecurityGroupBody { name }).await
}

/// Detach a security group from an instance by name.
pub async fn unassign_security_group(
    client: &ApiClient,
    instance_id: &str,
    name: &str,
) -> ApiResult<()> {
    let url = client.url("v1", "instances", &format!("{instance_id}/delsecuritygroup"))?;
    client.post_empty(&url, &SecurityGroupBody { name }).await
}
