//! Remote capabilities used by the resource handlers.
//!
//! Each trait is one slice of a remote service. A transport implements
//! them; handlers only see the traits, so tests swap in an in-memory cloud.

use crate::error::ApiResult;
use crate::target::TargetHeader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters for creating a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCreateRequest {
    pub name: String,
    pub datacenter: String,
    pub worker_num: usize,
    pub billing: String,
    pub machine_type: String,
    pub isolation: String,
    pub public_vlan: String,
    pub private_vlan: String,
    pub no_subnet: bool,
}

/// Returned by a successful cluster creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHandle {
    pub id: String,
}

/// Cluster as reported by the container service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterFields {
    pub id: String,
    pub name: String,
    pub state: String,
    pub server_url: String,
    pub ingress_hostname: String,
    pub ingress_secret_name: String,
    pub worker_count: u32,
}

/// Worker node as reported by the container service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFields {
    pub id: String,
    pub state: String,
    pub status: String,
}

impl WorkerFields {
    pub fn new(id: impl Into<String>, state: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
            status: status.into(),
        }
    }
}

/// Body of a worker add or update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerParam {
    pub action: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: u32,
}

const fn is_zero(count: &u32) -> bool {
    *count == 0
}

impl WorkerParam {
    /// Apply `action` (reboot, reload, ...) to an existing worker
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            count: 0,
        }
    }

    /// Add a single worker
    pub fn add() -> Self {
        Self {
            action: "add".to_string(),
            count: 1,
        }
    }
}

/// Notification hook attached to a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub level: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

/// Product order for an infrastructure item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub quantity: u32,
    pub package_id: u32,
    pub price_ids: Vec<u32>,
}

impl OrderRequest {
    /// Price of a hub object storage account
    pub const OBJECT_STORAGE_PRICE_ID: u32 = 30920;

    /// A single object storage account
    pub fn object_storage() -> Self {
        Self {
            quantity: 1,
            package_id: 0,
            price_ids: vec![Self::OBJECT_STORAGE_PRICE_ID],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: u64,
}

/// Billing item produced by a completed order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingOrderItem {
    pub billing_item_id: u64,
}

/// Progress of a placed order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingOrderStatus {
    pub complete: bool,
    pub item: Option<BillingOrderItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStorageAccount {
    pub username: String,
    pub billing_item_id: Option<u64>,
}

impl NetworkStorageAccount {
    pub fn new(username: impl Into<String>, billing_item_id: Option<u64>) -> Self {
        Self {
            username: username.into(),
            billing_item_id,
        }
    }
}

/// Cluster lifecycle calls
pub trait Clusters: Send + Sync {
    /// Start creating a cluster; returns before it is usable
    fn create(
        &self,
        params: &ClusterCreateRequest,
        target: &TargetHeader,
    ) -> ApiResult<ClusterHandle>;

    /// Fetch a cluster by id
    fn find(&self, cluster_id: &str, target: &TargetHeader) -> ApiResult<ClusterFields>;

    fn delete(&self, cluster_id: &str, target: &TargetHeader) -> ApiResult<()>;
}

/// Worker node calls, scoped to one cluster
pub trait Workers: Send + Sync {
    /// Every worker of the cluster, including ones being deleted
    fn list(&self, cluster_id: &str, target: &TargetHeader) -> ApiResult<Vec<WorkerFields>>;

    /// Add workers; the new ids are only visible through `list`
    fn add(&self, cluster_id: &str, params: &WorkerParam, target: &TargetHeader)
    -> ApiResult<()>;

    fn update(
        &self,
        cluster_id: &str,
        worker_id: &str,
        params: &WorkerParam,
        target: &TargetHeader,
    ) -> ApiResult<()>;

    fn delete(&self, cluster_id: &str, worker_id: &str, target: &TargetHeader) -> ApiResult<()>;
}

pub trait Subnets: Send + Sync {
    /// Attach an existing subnet to the cluster
    fn add(&self, cluster_id: &str, subnet_id: &str, target: &TargetHeader) -> ApiResult<()>;
}

pub trait Webhooks: Send + Sync {
    fn add(&self, cluster_id: &str, webhook: &Webhook, target: &TargetHeader) -> ApiResult<()>;
}

/// Infrastructure ordering
pub trait ProductOrders: Send + Sync {
    fn place_order(&self, order: &OrderRequest) -> ApiResult<OrderReceipt>;

    /// Current progress of a placed order
    fn billing_order_status(&self, receipt: &OrderReceipt) -> ApiResult<BillingOrderStatus>;
}

/// Network storage account queries
pub trait NetworkStorage: Send + Sync {
    /// Hub (object storage) accounts owned by the caller
    fn list_hub_storage(&self) -> ApiResult<Vec<NetworkStorageAccount>>;

    fn find_by_billing_item(&self, billing_item_id: u64) -> ApiResult<Vec<NetworkStorageAccount>>;

    fn find_by_username(&self, username: &str) -> ApiResult<Vec<NetworkStorageAccount>>;
}

/// Container service capabilities
#[derive(Clone)]
pub struct ContainerClients {
    pub clusters: Arc<dyn Clusters>,
    pub workers: Arc<dyn Workers>,
    pub subnets: Arc<dyn Subnets>,
    pub webhooks: Arc<dyn Webhooks>,
}

/// Infrastructure capabilities
#[derive(Clone)]
pub struct InfrastructureClients {
    pub orders: Arc<dyn ProductOrders>,
    pub network_storage: Arc<dyn NetworkStorage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_param_omits_zero_count() {
        let reboot = toml::to_string(&WorkerParam::action("reboot")).unwrap();
        assert_eq!(reboot.trim(), r#"action = "reboot""#);

        let add = toml::to_string(&WorkerParam::add()).unwrap();
        assert!(add.contains("count = 1"));

        let parsed: WorkerParam = toml::from_str(r#"action = "reload""#).unwrap();
        assert_eq!(parsed, WorkerParam::action("reload"));
    }
}
