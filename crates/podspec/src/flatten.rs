//! Pod spec to attribute tree
//!
//! Fields are written in declaration order. Optional fields at their zero
//! value are left out so a never-set field cannot show up as a change.

use crate::types::{
    AwsElasticBlockStoreSource, AzureFileSource, Container, ContainerPort, EnvVar,
    GcePersistentDiskSource, GlusterfsSource, HostPathSource, LocalObjectReference, NfsSource,
    PersistentVolumeClaimSource, PodSecurityContext, PodSpec, SeLinuxOptions, SecretSource,
    Volume, VolumeMount, VolumeSource,
};
use statetree::{Flatten, Tree, Value};

fn blocks<T: Flatten>(items: &[T]) -> Vec<Value> {
    items.iter().map(|item| Value::Block(item.flatten())).collect()
}

impl Flatten for PodSpec {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_int("active_deadline_seconds", self.active_deadline_seconds);
        tree.put_list("containers", blocks(&self.containers));
        tree.put_str("dns_policy", &self.dns_policy);
        tree.put_flag("host_ipc", self.host_ipc);
        tree.put_flag("host_network", self.host_network);
        tree.put_flag("host_pid", self.host_pid);
        tree.put_str("hostname", &self.hostname);
        tree.put_list("image_pull_secrets", blocks(&self.image_pull_secrets));
        tree.put_str("node_name", &self.node_name);
        tree.put_string_map("node_selector", &self.node_selector);
        tree.put_str("restart_policy", &self.restart_policy);
        tree.put_opt_block(
            "security_context",
            self.security_context.as_ref().map(Flatten::flatten),
        );
        tree.put_str("service_account_name", &self.service_account_name);
        tree.put_str("subdomain", &self.subdomain);
        tree.put_int(
            "termination_grace_period_seconds",
            self.termination_grace_period_seconds,
        );
        tree.put_list("volumes", blocks(&self.volumes));
        tree
    }
}

impl Flatten for Container {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("image", &self.image);
        tree.put_strings("command", &self.command);
        tree.put_strings("args", &self.args);
        tree.put_str("working_dir", &self.working_dir);
        tree.put_list("env", blocks(&self.env));
        tree.put_list("port", blocks(&self.ports));
        tree.put_str("image_pull_policy", &self.image_pull_policy);
        tree.put_list("volume_mount", blocks(&self.volume_mounts));
        tree
    }
}

impl Flatten for EnvVar {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("value", &self.value);
        tree
    }
}

impl Flatten for ContainerPort {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.set("container_port", self.container_port);
        tree.put_int("host_port", self.host_port.map(i64::from));
        tree.put_str("protocol", &self.protocol);
        tree
    }
}

impl Flatten for VolumeMount {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("mount_path", &self.mount_path);
        tree.put_flag("read_only", self.read_only);
        tree.put_str("sub_path", &self.sub_path);
        tree
    }
}

impl Flatten for LocalObjectReference {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree
    }
}

impl Flatten for PodSecurityContext {
    /// An empty context flattens to an empty tree, which callers omit
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_int("fs_group", self.fs_group);
        tree.put_opt_bool("run_as_non_root", self.run_as_non_root);
        tree.put_int("run_as_user", self.run_as_user);
        tree.put_ints("supplemental_groups", &self.supplemental_groups);
        tree.put_opt_block(
            "se_linux_options",
            self.se_linux_options.as_ref().map(Flatten::flatten),
        );
        tree
    }
}

impl Flatten for SeLinuxOptions {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("user", &self.user);
        tree.put_str("role", &self.role);
        tree.put_str("type", &self.kind);
        tree.put_str("level", &self.level);
        tree
    }
}

impl Flatten for Volume {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        // Written even when empty: the key alone selects the shape
        tree.put_block(self.source.shape(), self.source.flatten());
        tree
    }
}

impl Flatten for VolumeSource {
    fn flatten(&self) -> Tree {
        match self {
            Self::PersistentVolumeClaim(s) => s.flatten(),
            Self::Secret(s) => s.flatten(),
            Self::GcePersistentDisk(s) => s.flatten(),
            Self::AwsElasticBlockStore(s) => s.flatten(),
            Self::HostPath(s) => s.flatten(),
            Self::Glusterfs(s) => s.flatten(),
            Self::Nfs(s) => s.flatten(),
            Self::AzureFile(s) => s.flatten(),
        }
    }
}

impl Flatten for PersistentVolumeClaimSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("claim_name", &self.claim_name);
        tree.put_flag("read_only", self.read_only);
        tree
    }
}

impl Flatten for SecretSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("secret_name", &self.secret_name);
        tree.put_int("default_mode", self.default_mode.map(i64::from));
        tree
    }
}

impl Flatten for GcePersistentDiskSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("pd_name", &self.pd_name);
        tree.put_str("fs_type", &self.fs_type);
        tree.put_int("partition", self.partition.map(i64::from));
        tree.put_flag("read_only", self.read_only);
        tree
    }
}

impl Flatten for AwsElasticBlockStoreSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("volume_id", &self.volume_id);
        tree.put_str("fs_type", &self.fs_type);
        tree.put_int("partition", self.partition.map(i64::from));
        tree.put_flag("read_only", self.read_only);
        tree
    }
}

impl Flatten for HostPathSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("path", &self.path);
        tree
    }
}

impl Flatten for GlusterfsSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("endpoints_name", &self.endpoints_name);
        tree.put_str("path", &self.path);
        tree.put_flag("read_only", self.read_only);
        tree
    }
}

impl Flatten for NfsSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("server", &self.server);
        tree.put_str("path", &self.path);
        tree.put_flag("read_only", self.read_only);
        tree
    }
}

impl Flatten for AzureFileSource {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("secret_name", &self.secret_name);
        tree.put_str("share_name", &self.share_name);
        tree.put_flag("read_only", self.read_only);
        tree
    }
}
