//! Declared and observed cluster attributes

use crate::api::{ClusterCreateRequest, ClusterFields, Webhook};
use crate::target::TargetHeader;
use statetree::{Error, Expand, Fields, Flatten, Result, Tree, Value};

/// Minutes each cluster wait phase may take by default
pub const DEFAULT_WAIT_TIME_MINUTES: u64 = 90;

pub const DEFAULT_BILLING: &str = "hourly";

pub const DEFAULT_WORKER_ACTION: &str = "add";

/// Actions a declared worker may carry
pub const WORKER_ACTIONS: &[&str] = &["add", "reboot", "reload"];

pub const WEBHOOK_TYPES: &[&str] = &["slack"];

/// A declared worker node. `id` is computed after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub name: String,
    pub id: String,
    pub action: String,
}

impl WorkerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            action: DEFAULT_WORKER_ACTION.to_string(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Declared state of a container cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub name: String,
    pub datacenter: String,
    pub workers: Vec<WorkerSpec>,
    pub machine_type: String,
    pub isolation: String,
    pub billing: String,
    pub public_vlan_id: String,
    pub private_vlan_id: String,
    pub no_subnet: bool,
    pub subnet_ids: Vec<String>,
    pub webhooks: Vec<Webhook>,
    pub target: TargetHeader,
    pub wait_time_minutes: u64,
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            datacenter: String::new(),
            workers: Vec::new(),
            machine_type: String::new(),
            isolation: String::new(),
            billing: DEFAULT_BILLING.to_string(),
            public_vlan_id: String::new(),
            private_vlan_id: String::new(),
            no_subnet: false,
            subnet_ids: Vec::new(),
            webhooks: Vec::new(),
            target: TargetHeader::default(),
            wait_time_minutes: DEFAULT_WAIT_TIME_MINUTES,
        }
    }
}

impl ClusterSpec {
    /// Creation request; one worker per declared worker
    pub fn create_request(&self) -> ClusterCreateRequest {
        ClusterCreateRequest {
            name: self.name.clone(),
            datacenter: self.datacenter.clone(),
            worker_num: self.workers.len(),
            billing: self.billing.clone(),
            machine_type: self.machine_type.clone(),
            isolation: self.isolation.clone(),
            public_vlan: self.public_vlan_id.clone(),
            private_vlan: self.private_vlan_id.clone(),
            no_subnet: self.no_subnet,
        }
    }
}

/// Computed attributes read back from the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterState {
    pub name: String,
    pub server_url: String,
    pub ingress_hostname: String,
    pub ingress_secret: String,
    pub worker_num: u32,
}

impl From<&ClusterFields> for ClusterState {
    fn from(fields: &ClusterFields) -> Self {
        Self {
            name: fields.name.clone(),
            server_url: fields.server_url.clone(),
            ingress_hostname: fields.ingress_hostname.clone(),
            ingress_secret: fields.ingress_secret_name.clone(),
            worker_num: fields.worker_count,
        }
    }
}

/// A managed cluster: its id, what was declared and what was read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub id: String,
    pub spec: ClusterSpec,
    pub state: ClusterState,
}

impl Flatten for WorkerSpec {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("id", &self.id);
        if self.action != DEFAULT_WORKER_ACTION {
            tree.put_str("action", &self.action);
        }
        tree
    }
}

impl Expand for WorkerSpec {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.required_string("name")?,
            id: fields.string("id")?,
            action: fields.one_of("action", WORKER_ACTIONS, DEFAULT_WORKER_ACTION)?,
        })
    }
}

impl Flatten for Webhook {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("level", &self.level);
        tree.put_str("type", &self.kind);
        tree.put_str("url", &self.url);
        tree
    }
}

impl Expand for Webhook {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        fields.required_string("type")?;
        Ok(Self {
            level: fields.required_string("level")?,
            kind: fields.one_of("type", WEBHOOK_TYPES, "")?,
            url: fields.required_string("url")?,
        })
    }
}

impl Flatten for ClusterSpec {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("datacenter", &self.datacenter);
        tree.put_list(
            "workers",
            self.workers.iter().map(|w| Value::from(w.flatten())).collect(),
        );
        tree.put_str("machine_type", &self.machine_type);
        tree.put_str("isolation", &self.isolation);
        if self.billing != DEFAULT_BILLING {
            tree.put_str("billing", &self.billing);
        }
        tree.put_str("public_vlan_id", &self.public_vlan_id);
        tree.put_str("private_vlan_id", &self.private_vlan_id);
        tree.put_flag("no_subnet", self.no_subnet);
        tree.put_strings("subnet_id", &self.subnet_ids);
        tree.put_list(
            "webhook",
            self.webhooks.iter().map(|w| Value::from(w.flatten())).collect(),
        );
        tree.put_str("org_guid", &self.target.org_guid);
        tree.put_str("space_guid", &self.target.space_guid);
        tree.put_str("account_guid", &self.target.account_guid);
        tree.put_str("region", &self.target.region);
        if self.wait_time_minutes != DEFAULT_WAIT_TIME_MINUTES {
            tree.put_nonzero(
                "wait_time_minutes",
                i64::try_from(self.wait_time_minutes).unwrap_or(i64::MAX),
            );
        }
        tree
    }
}

impl Expand for ClusterSpec {
    fn expand(fields: &Fields<'_>) -> Result<Self> {
        let workers: Vec<WorkerSpec> = fields.expand_all("workers")?;
        if workers.is_empty() {
            return Err(Error::MissingField {
                path: fields.path_of("workers"),
            });
        }

        Ok(Self {
            name: fields.required_string("name")?,
            datacenter: fields.required_string("datacenter")?,
            workers,
            machine_type: fields.string("machine_type")?,
            isolation: fields.string("isolation")?,
            billing: fields.string_or("billing", DEFAULT_BILLING)?,
            public_vlan_id: fields.string("public_vlan_id")?,
            private_vlan_id: fields.string("private_vlan_id")?,
            no_subnet: fields.bool("no_subnet")?,
            subnet_ids: fields.strings("subnet_id")?,
            webhooks: fields.expand_all("webhook")?,
            target: TargetHeader {
                org_guid: fields.required_string("org_guid")?,
                space_guid: fields.required_string("space_guid")?,
                account_guid: fields.required_string("account_guid")?,
                region: fields.string("region")?,
            },
            wait_time_minutes: fields
                .opt_int_as("wait_time_minutes")?
                .unwrap_or(DEFAULT_WAIT_TIME_MINUTES),
        })
    }
}

impl Flatten for ClusterState {
    fn flatten(&self) -> Tree {
        let mut tree = Tree::new();
        tree.put_str("name", &self.name);
        tree.put_str("server_url", &self.server_url);
        tree.put_str("ingress_hostname", &self.ingress_hostname);
        tree.put_str("ingress_secret", &self.ingress_secret);
        tree.set("worker_num", i64::from(self.worker_num));
        tree
    }
}
