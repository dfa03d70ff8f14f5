//! # Podspec
//!
//! Pod spec support for the resource tree: the codec between the remote
//! pod spec and its attribute tree, the filter that hides
//! platform-injected volumes on read, and the descriptors used to patch a
//! running pod.
//!
//! ## Example
//!
//! ```ignore
//! use podspec::{PodSpec, read_pod_spec};
//! use statetree::Expand;
//!
//! // Read: hide injected token volumes, then flatten
//! let observed = read_pod_spec(&pod.spec, &secrets, "default")?;
//!
//! // Write: expand the planned tree back into a pod spec
//! let desired = PodSpec::from_tree(&planned)?;
//! ```

mod expand;
mod flatten;

pub mod filter;
pub mod patch;
pub mod read;
pub mod types;

pub use filter::{
    InternalEntityRule, LookupError, Secret, SecretList, SecretLookup, classify,
    pick_user_volumes,
};
pub use patch::{patch_pod_spec, pod_spec_descriptors};
pub use read::{read_pod_spec, read_pod_spec_with};
pub use types::{
    AwsElasticBlockStoreSource, AzureFileSource, Container, ContainerPort, EnvVar,
    GcePersistentDiskSource, GlusterfsSource, HostPathSource, LocalObjectReference, NfsSource,
    ObjectMeta, PersistentVolumeClaimSource, Pod, PodSecurityContext, PodSpec, SeLinuxOptions,
    SecretSource, Volume, VolumeMount, VolumeSource,
};
