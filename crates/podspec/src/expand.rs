//! Attribute tree to pod spec

use crate::types::{
    AwsElasticBlockStoreSource, AzureFileSource, Container, ContainerPort, EnvVar,
    GcePersistentDiskSource, GlusterfsSource, HostPathSource, LocalObjectReference, NfsSource,
    PersistentVolumeClaimSource, PodSecurityContext, PodSpec, SeLinuxOptions, SecretSource,
    Volume, VolumeMount, VolumeSource,
};
use statetree::{Error, Expand, Fields, Result};

impl Expand for PodSpec {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            active_deadline_seconds: fields.opt_int("active_deadline_seconds")?,
            containers: fields.expand_all("containers")?,
            dns_policy: fields.string("dns_policy")?,
            host_ipc: fields.bool("host_ipc")?,
            host_network: fields.bool("host_network")?,
            host_pid: fields.bool("host_pid")?,
            hostname: fields.string("hostname")?,
            image_pull_secrets: fields.expand_all("image_pull_secrets")?,
            node_name: fields.string("node_name")?,
            node_selector: fields.string_map("node_selector")?,
            restart_policy: fields.string("restart_policy")?,
            security_context: fields.expand_block("security_context")?,
            service_account_name: fields.string("service_account_name")?,
            subdomain: fields.string("subdomain")?,
            termination_grace_period_seconds: fields.opt_int("termination_grace_period_seconds")?,
            volumes: fields.expand_all("volumes")?,
        })
    }
}

impl Expand for Container {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            image: fields.string("image")?,
            command: fields.strings("command")?,
            args: fields.strings("args")?,
            working_dir: fields.string("working_dir")?,
            env: fields.expand_all("env")?,
            ports: fields.expand_all("port")?,
            image_pull_policy: fields.string("image_pull_policy")?,
            volume_mounts: fields.expand_all("volume_mount")?,
        })
    }
}

impl Expand for EnvVar {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            value: fields.string("value")?,
        })
    }
}

impl Expand for ContainerPort {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        let container_port = fields
            .opt_int_as("container_port")?
            .ok_or_else(|| Error::MissingField {
                path: fields.path_of("container_port"),
            })?;
        Ok(Self {
            name: fields.string("name")?,
            container_port,
            host_port: fields.opt_int_as("host_port")?,
            protocol: fields.string("protocol")?,
        })
    }
}

impl Expand for VolumeMount {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            mount_path: fields.required_string("mount_path")?,
            read_only: fields.bool("read_only")?,
            sub_path: fields.string("sub_path")?,
        })
    }
}

impl Expand for LocalObjectReference {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.string("name")?,
        })
    }
}

impl Expand for PodSecurityContext {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            fs_group: fields.opt_int("fs_group")?,
            run_as_non_root: fields.opt_bool("run_as_non_root")?,
            run_as_user: fields.opt_int("run_as_user")?,
            supplemental_groups: fields.ints("supplemental_groups")?,
            se_linux_options: fields.expand_block("se_linux_options")?,
        })
    }
}

impl Expand for SeLinuxOptions {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            user: fields.string("user")?,
            role: fields.string("role")?,
            kind: fields.string("type")?,
            level: fields.string("level")?,
        })
    }
}

impl Expand for Volume {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        let populated: Vec<&str> = VolumeSource::SHAPES
            .into_iter()
            .filter(|shape| fields.has(shape))
            .collect();

        let shape = match populated.as_slice() {
            [shape] => *shape,
            [] => {
                return Err(Error::MissingShape {
                    path: fields.path().to_string(),
                    expected: VolumeSource::SHAPES.iter().map(ToString::to_string).collect(),
                });
            }
            _ => {
                return Err(Error::ConflictingShapes {
                    path: fields.path().to_string(),
                    found: populated.iter().map(ToString::to_string).collect(),
                });
            }
        };

        let Some(block) = fields.block(shape)? else {
            return Err(Error::MissingField {
                path: fields.path_of(shape),
            });
        };

        Ok(Self {
            name: fields.string("name")?,
            source: expand_source(shape, &block)?,
        })
    }
}

/// Decode the block of one volume shape
fn expand_source(shape: &str, block: &Fields<'_>) -> Result<VolumeSource> {
    Ok(match shape {
        "persistent_volume_claim" => {
            VolumeSource::PersistentVolumeClaim(PersistentVolumeClaimSource::expand(block)?)
        }
        "secret" => VolumeSource::Secret(SecretSource::expand(block)?),
        "gce_persistent_disk" => {
            VolumeSource::GcePersistentDisk(GcePersistentDiskSource::expand(block)?)
        }
        "aws_elastic_block_store" => {
            VolumeSource::AwsElasticBlockStore(AwsElasticBlockStoreSource::expand(block)?)
        }
        "host_path" => VolumeSource::HostPath(HostPathSource::expand(block)?),
        "glusterfs" => VolumeSource::Glusterfs(GlusterfsSource::expand(block)?),
        "nfs" => VolumeSource::Nfs(NfsSource::expand(block)?),
        "azure_file" => VolumeSource::AzureFile(AzureFileSource::expand(block)?),
        other => {
            return Err(Error::InvalidValue {
                path: block.path().to_string(),
                value: other.to_string(),
                allowed: VolumeSource::SHAPES.iter().map(ToString::to_string).collect(),
            });
        }
    })
}

impl Expand for PersistentVolumeClaimSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            claim_name: fields.string("claim_name")?,
            read_only: fields.bool("read_only")?,
        })
    }
}

impl Expand for SecretSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            secret_name: fields.string("secret_name")?,
            default_mode: fields.opt_int_as("default_mode")?,
        })
    }
}

impl Expand for GcePersistentDiskSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            pd_name: fields.string("pd_name")?,
            fs_type: fields.string("fs_type")?,
            partition: fields.opt_int_as("partition")?,
            read_only: fields.bool("read_only")?,
        })
    }
}

impl Expand for AwsElasticBlockStoreSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            volume_id: fields.string("volume_id")?,
            fs_type: fields.string("fs_type")?,
            partition: fields.opt_int_as("partition")?,
            read_only: fields.bool("read_only")?,
        })
    }
}

impl Expand for HostPathSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            path: fields.string("path")?,
        })
    }
}

impl Expand for GlusterfsSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            endpoints_name: fields.string("endpoints_name")?,
            path: fields.string("path")?,
            read_only: fields.bool("read_only")?,
        })
    }
}

impl Expand for NfsSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            server: fields.string("server")?,
            path: fields.string("path")?,
            read_only: fields.bool("read_only")?,
        })
    }
}

impl Expand for AzureFileSource {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            secret_name: fields.string("secret_name")?,
            share_name: fields.string("share_name")?,
            read_only: fields.bool("read_only")?,
        })
    }
}
