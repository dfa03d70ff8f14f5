//! External pod types in their remote JSON shape (camelCase).
//!
//! Only the fields this crate manages are modelled. Unknown fields in
//! remote documents are ignored on read.

use serde::{Deserialize, Serialize};
use statetree::Error;
use std::collections::BTreeMap;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Object metadata shared by pods and secrets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A pod as returned by the cluster API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_deadline_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dns_policy: String,
    #[serde(rename = "hostIPC", skip_serializing_if = "is_false")]
    pub host_ipc: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub host_network: bool,
    #[serde(rename = "hostPID", skip_serializing_if = "is_false")]
    pub host_pid: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub restart_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_pull_policy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerPort {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub container_port: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSecurityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_non_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supplemental_groups: Vec<i64>,
    #[serde(rename = "seLinuxOptions", skip_serializing_if = "Option::is_none")]
    pub se_linux_options: Option<SeLinuxOptions>,
}

impl PodSecurityContext {
    /// The API returns an empty context even when none was requested
    pub fn is_empty(&self) -> bool {
        self.fs_group.is_none()
            && self.run_as_non_root.is_none()
            && self.run_as_user.is_none()
            && self.supplemental_groups.is_empty()
            && self.se_linux_options.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeLinuxOptions {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalObjectReference {
    pub name: String,
}

// Volume sources

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistentVolumeClaimSource {
    pub claim_name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretSource {
    pub secret_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GcePersistentDiskSource {
    pub pd_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fs_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsElasticBlockStoreSource {
    #[serde(rename = "volumeID")]
    pub volume_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fs_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPathSource {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlusterfsSource {
    #[serde(rename = "endpoints")]
    pub endpoints_name: String,
    pub path: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NfsSource {
    pub server: String,
    pub path: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureFileSource {
    pub secret_name: String,
    pub share_name: String,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
}

/// Storage backend of a volume. Exactly one per volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    PersistentVolumeClaim(PersistentVolumeClaimSource),
    Secret(SecretSource),
    GcePersistentDisk(GcePersistentDiskSource),
    AwsElasticBlockStore(AwsElasticBlockStoreSource),
    HostPath(HostPathSource),
    Glusterfs(GlusterfsSource),
    Nfs(NfsSource),
    AzureFile(AzureFileSource),
}

impl VolumeSource {
    /// Attribute keys of every shape, in priority order
    pub const SHAPES: [&'static str; 8] = [
        "persistent_volume_claim",
        "secret",
        "gce_persistent_disk",
        "aws_elastic_block_store",
        "host_path",
        "glusterfs",
        "nfs",
        "azure_file",
    ];

    /// Attribute key of this shape
    pub fn shape(&self) -> &'static str {
        match self {
            Self::PersistentVolumeClaim(_) => "persistent_volume_claim",
            Self::Secret(_) => "secret",
            Self::GcePersistentDisk(_) => "gce_persistent_disk",
            Self::AwsElasticBlockStore(_) => "aws_elastic_block_store",
            Self::HostPath(_) => "host_path",
            Self::Glusterfs(_) => "glusterfs",
            Self::Nfs(_) => "nfs",
            Self::AzureFile(_) => "azure_file",
        }
    }

    pub fn as_secret(&self) -> Option<&SecretSource> {
        match self {
            Self::Secret(secret) => Some(secret),
            _ => None,
        }
    }
}

/// A named volume with exactly one source.
///
/// The remote document spells the source as one optional field per shape;
/// decoding rejects documents with zero or several of them populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVolume", into = "RawVolume")]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

impl Volume {
    pub fn new(name: impl Into<String>, source: VolumeSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawVolume {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    persistent_volume_claim: Option<PersistentVolumeClaimSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<SecretSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gce_persistent_disk: Option<GcePersistentDiskSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_elastic_block_store: Option<AwsElasticBlockStoreSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_path: Option<HostPathSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glusterfs: Option<GlusterfsSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nfs: Option<NfsSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    azure_file: Option<AzureFileSource>,
}

impl TryFrom<RawVolume> for Volume {
    type Error = Error;

    fn try_from(raw: RawVolume) -> Result<Self, Error> {
        let mut found: Vec<VolumeSource> = [
            raw.persistent_volume_claim
                .map(VolumeSource::PersistentVolumeClaim),
            raw.secret.map(VolumeSource::Secret),
            raw.gce_persistent_disk.map(VolumeSource::GcePersistentDisk),
            raw.aws_elastic_block_store
                .map(VolumeSource::AwsElasticBlockStore),
            raw.host_path.map(VolumeSource::HostPath),
            raw.glusterfs.map(VolumeSource::Glusterfs),
            raw.nfs.map(VolumeSource::Nfs),
            raw.azure_file.map(VolumeSource::AzureFile),
        ]
        .into_iter()
        .flatten()
        .collect();

        let path = format!("volumes.{}", raw.name);
        match found.len() {
            0 => Err(Error::MissingShape {
                path,
                expected: VolumeSource::SHAPES.iter().map(ToString::to_string).collect(),
            }),
            1 => Ok(Self {
                name: raw.name,
                source: found.remove(0),
            }),
            _ => Err(Error::ConflictingShapes {
                path,
                found: found.iter().map(|s| s.shape().to_string()).collect(),
            }),
        }
    }
}

impl From<Volume> for RawVolume {
    fn from(volume: Volume) -> Self {
        let mut raw = Self {
            name: volume.name,
            ..Self::default()
        };
        match volume.source {
            VolumeSource::PersistentVolumeClaim(s) => raw.persistent_volume_claim = Some(s),
            VolumeSource::Secret(s) => raw.secret = Some(s),
            VolumeSource::GcePersistentDisk(s) => raw.gce_persistent_disk = Some(s),
            VolumeSource::AwsElasticBlockStore(s) => raw.aws_elastic_block_store = Some(s),
            VolumeSource::HostPath(s) => raw.host_path = Some(s),
            VolumeSource::Glusterfs(s) => raw.glusterfs = Some(s),
            VolumeSource::Nfs(s) => raw.nfs = Some(s),
            VolumeSource::AzureFile(s) => raw.azure_file = Some(s),
        }
        raw
    }
}
