//! In-memory cloud with scripted responses, for handler tests.
//!
//! Each scripted queue hands out its entries in order and then keeps
//! repeating the last one. Every call is logged.

use crate::api::{
    BillingOrderStatus, ClusterCreateRequest, ClusterFields, ClusterHandle, Clusters,
    ContainerClients, InfrastructureClients, NetworkStorage, NetworkStorageAccount, OrderReceipt,
    OrderRequest, ProductOrders, Subnets, Webhook, Webhooks, WorkerFields, WorkerParam, Workers,
};
use crate::config::SessionConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::Connector;
use crate::target::TargetHeader;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Script<T> {
    queue: VecDeque<ApiResult<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<T: Clone + Default> Script<T> {
    fn set(&mut self, responses: impl IntoIterator<Item = ApiResult<T>>) {
        self.queue = responses.into_iter().collect();
    }

    fn next(&mut self) -> ApiResult<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front().unwrap()
        } else {
            self.queue.front().cloned().unwrap_or_else(|| Ok(T::default()))
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    cluster_id: String,
    clusters: Script<ClusterFields>,
    workers: Script<Vec<WorkerFields>>,
    order_statuses: Script<BillingOrderStatus>,
    delete_cluster: Option<ApiError>,
    hub_storage: Vec<NetworkStorageAccount>,
    storage: Vec<NetworkStorageAccount>,
}

#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<State>,
}

impl FakeCloud {
    pub fn shared() -> Arc<Self> {
        let cloud = Self::default();
        cloud.state().cluster_id = "c1".to_string();
        Arc::new(cloud)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn log(&self, call: String) {
        self.state().calls.push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Cluster `c1` named `prod` going through `states`
    pub fn script_cluster<'a>(&self, states: impl IntoIterator<Item = &'a str>) {
        self.script_clusters(states.into_iter().map(|state| ClusterFields {
            id: "c1".to_string(),
            name: "prod".to_string(),
            state: state.to_string(),
            ..ClusterFields::default()
        }));
    }

    pub fn script_clusters(&self, clusters: impl IntoIterator<Item = ClusterFields>) {
        self.state().clusters.set(clusters.into_iter().map(Ok));
    }

    pub fn fail_cluster_find(&self, error: ApiError) {
        self.state().clusters.set([Err(error)]);
    }

    pub fn fail_cluster_delete(&self, error: ApiError) {
        self.state().delete_cluster = Some(error);
    }

    pub fn script_workers(&self, lists: impl IntoIterator<Item = Vec<WorkerFields>>) {
        self.state().workers.set(lists.into_iter().map(Ok));
    }

    pub fn fail_worker_list(&self, error: ApiError) {
        self.state().workers.set([Err(error)]);
    }

    pub fn script_orders(&self, statuses: impl IntoIterator<Item = BillingOrderStatus>) {
        self.state().order_statuses.set(statuses.into_iter().map(Ok));
    }

    pub fn set_hub_storage(&self, accounts: Vec<NetworkStorageAccount>) {
        self.state().hub_storage = accounts;
    }

    pub fn set_storage(&self, accounts: Vec<NetworkStorageAccount>) {
        self.state().storage = accounts;
    }
}

impl Clusters for FakeCloud {
    fn create(
        &self,
        params: &ClusterCreateRequest,
        _target: &TargetHeader,
    ) -> ApiResult<ClusterHandle> {
        self.log(format!("clusters.create {} x{}", params.name, params.worker_num));
        Ok(ClusterHandle {
            id: self.state().cluster_id.clone(),
        })
    }

    fn find(&self, cluster_id: &str, _target: &TargetHeader) -> ApiResult<ClusterFields> {
        self.log(format!("clusters.find {cluster_id}"));
        self.state().clusters.next()
    }

    fn delete(&self, cluster_id: &str, _target: &TargetHeader) -> ApiResult<()> {
        self.log(format!("clusters.delete {cluster_id}"));
        self.state().delete_cluster.clone().map_or(Ok(()), Err)
    }
}

impl Workers for FakeCloud {
    fn list(&self, cluster_id: &str, _target: &TargetHeader) -> ApiResult<Vec<WorkerFields>> {
        self.log(format!("workers.list {cluster_id}"));
        self.state().workers.next()
    }

    fn add(
        &self,
        cluster_id: &str,
        params: &WorkerParam,
        _target: &TargetHeader,
    ) -> ApiResult<()> {
        self.log(format!("workers.add {cluster_id} x{}", params.count));
        Ok(())
    }

    fn update(
        &self,
        cluster_id: &str,
        worker_id: &str,
        params: &WorkerParam,
        _target: &TargetHeader,
    ) -> ApiResult<()> {
        self.log(format!("workers.update {cluster_id}/{worker_id} {}", params.action));
        Ok(())
    }

    fn delete(&self, cluster_id: &str, worker_id: &str, _target: &TargetHeader) -> ApiResult<()> {
        self.log(format!("workers.delete {cluster_id}/{worker_id}"));
        Ok(())
    }
}

impl Subnets for FakeCloud {
    fn add(&self, cluster_id: &str, subnet_id: &str, _target: &TargetHeader) -> ApiResult<()> {
        self.log(format!("subnets.add {cluster_id}/{subnet_id}"));
        Ok(())
    }
}

impl Webhooks for FakeCloud {
    fn add(&self, cluster_id: &str, webhook: &Webhook, _target: &TargetHeader) -> ApiResult<()> {
        self.log(format!("webhooks.add {cluster_id} {}", webhook.url));
        Ok(())
    }
}

impl ProductOrders for FakeCloud {
    fn place_order(&self, order: &OrderRequest) -> ApiResult<OrderReceipt> {
        self.log(format!("orders.place {:?}", order.price_ids));
        Ok(OrderReceipt { order_id: 7 })
    }

    fn billing_order_status(&self, receipt: &OrderReceipt) -> ApiResult<BillingOrderStatus> {
        self.log(format!("orders.status {}", receipt.order_id));
        self.state().order_statuses.next()
    }
}

impl NetworkStorage for FakeCloud {
    fn list_hub_storage(&self) -> ApiResult<Vec<NetworkStorageAccount>> {
        self.log("storage.hub".to_string());
        Ok(self.state().hub_storage.clone())
    }

    fn find_by_billing_item(&self, billing_item_id: u64) -> ApiResult<Vec<NetworkStorageAccount>> {
        self.log(format!("storage.billing {billing_item_id}"));
        Ok(self
            .state()
            .storage
            .iter()
            .filter(|a| a.billing_item_id == Some(billing_item_id))
            .cloned()
            .collect())
    }

    fn find_by_username(&self, username: &str) -> ApiResult<Vec<NetworkStorageAccount>> {
        self.log(format!("storage.username {username}"));
        let state = self.state();
        Ok(state
            .hub_storage
            .iter()
            .chain(&state.storage)
            .filter(|a| a.username == username)
            .cloned()
            .collect())
    }
}

/// Connector handing out one shared [`FakeCloud`]
pub struct FakeConnector {
    cloud: Arc<FakeCloud>,
    container_error: Option<ApiError>,
    container_calls: AtomicUsize,
}

impl FakeConnector {
    pub fn new(cloud: Arc<FakeCloud>) -> Self {
        Self {
            cloud,
            container_error: None,
            container_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing_container(mut self, error: ApiError) -> Self {
        self.container_error = Some(error);
        self
    }

    pub fn container_calls(&self) -> usize {
        self.container_calls.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn container(&self, _config: &SessionConfig) -> ApiResult<ContainerClients> {
        self.container_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.container_error {
            return Err(error.clone());
        }
        Ok(ContainerClients {
            clusters: self.cloud.clone(),
            workers: self.cloud.clone(),
            subnets: self.cloud.clone(),
            webhooks: self.cloud.clone(),
        })
    }

    fn infrastructure(&self, _config: &SessionConfig) -> ApiResult<InfrastructureClients> {
        Ok(InfrastructureClients {
            orders: self.cloud.clone(),
            network_storage: self.cloud.clone(),
        })
    }
}

/// Session over `cloud` with every capability configured and no retries
pub fn session(cloud: &Arc<FakeCloud>) -> crate::session::ClientSession {
    let config = SessionConfig {
        bluemix_api_key: "key".to_string(),
        softlayer_username: "ops".to_string(),
        softlayer_api_key: "sl-key".to_string(),
        ..SessionConfig::default()
    };
    crate::session::ClientSession::new(&config, &FakeConnector::new(Arc::clone(cloud)))
        .unwrap()
        .with_retry_policy(crate::retry::RetryPolicy::no_retry())
}
