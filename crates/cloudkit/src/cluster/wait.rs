//! State labels and waits for clusters, workers and subnets

use crate::api::{ClusterFields, Clusters, WorkerFields, Workers};
use crate::config::WaitSettings;
use crate::error::{Observed, ProviderError, Result};
use crate::target::TargetHeader;
use converge::{BoxError, CancelToken, Observation};
use std::collections::BTreeSet;
use std::time::Duration;

pub const STATE_NORMAL: &str = "normal";
pub const STATE_PROVISIONING: &str = "provisioning";
pub const STATE_RETRY: &str = "retry";
pub const STATE_DELETING: &str = "deleting";
pub const STATE_DELETED: &str = "deleted";
pub const WORKER_STATUS_READY: &str = "Ready";

/// Any state other than normal counts as still provisioning
pub fn cluster_state(fields: &ClusterFields) -> &'static str {
    if fields.state == STATE_NORMAL {
        STATE_NORMAL
    } else {
        STATE_PROVISIONING
    }
}

/// Normal once every worker that is not deleted is normal and Ready
pub fn workers_state(workers: &[WorkerFields]) -> &'static str {
    let provisioning = workers.iter().any(|w| {
        w.state != STATE_DELETED
            && !(w.state == STATE_NORMAL && w.status == WORKER_STATUS_READY)
    });
    if provisioning {
        STATE_PROVISIONING
    } else {
        STATE_NORMAL
    }
}

/// Subnets are attached once the ingress hostname or secret shows up
pub fn subnet_state(fields: &ClusterFields) -> &'static str {
    if fields.ingress_hostname.is_empty() && fields.ingress_secret_name.is_empty() {
        STATE_PROVISIONING
    } else {
        STATE_NORMAL
    }
}

/// Deleted once none of `removed` is listed in another state
pub fn deletion_state(workers: &[WorkerFields], removed: &BTreeSet<String>) -> &'static str {
    let pending = workers
        .iter()
        .any(|w| removed.contains(&w.id) && w.state != STATE_DELETED);
    if pending { STATE_DELETING } else { STATE_DELETED }
}

fn find_cluster(
    clusters: &dyn Clusters,
    cluster_id: &str,
    target: &TargetHeader,
    label: fn(&ClusterFields) -> &'static str,
) -> std::result::Result<Observation<ClusterFields>, BoxError> {
    let fields = clusters.find(cluster_id, target)?;
    let state = label(&fields);
    Ok(Observation::new(fields, state))
}

pub fn wait_for_cluster_available(
    clusters: &dyn Clusters,
    cluster_id: &str,
    target: &TargetHeader,
    settings: &WaitSettings,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ClusterFields> {
    settings
        .conf(
            format!("cluster ({cluster_id}) to become ready"),
            [STATE_RETRY, STATE_PROVISIONING],
            [STATE_NORMAL],
            timeout,
        )
        .wait_for_state_with_cancel(
            || find_cluster(clusters, cluster_id, target, cluster_state),
            cancel,
        )
        .map_err(|e| {
            ProviderError::wait(format!("error waiting for cluster ({cluster_id})"))(
                e.map(Observed::Cluster),
            )
        })
}

pub fn wait_for_subnet_available(
    clusters: &dyn Clusters,
    cluster_id: &str,
    target: &TargetHeader,
    settings: &WaitSettings,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ClusterFields> {
    settings
        .conf(
            format!("cluster ({cluster_id}) subnet to be attached"),
            [STATE_PROVISIONING],
            [STATE_NORMAL],
            timeout,
        )
        .wait_for_state_with_cancel(
            || find_cluster(clusters, cluster_id, target, subnet_state),
            cancel,
        )
        .map_err(|e| {
            ProviderError::wait(format!("error waiting for subnet of cluster ({cluster_id})"))(
                e.map(Observed::Cluster),
            )
        })
}

pub fn wait_for_workers_available(
    workers: &dyn Workers,
    cluster_id: &str,
    target: &TargetHeader,
    settings: &WaitSettings,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<Vec<WorkerFields>> {
    settings
        .conf(
            format!("workers of cluster ({cluster_id}) to become ready"),
            [STATE_RETRY, STATE_PROVISIONING],
            [STATE_NORMAL],
            timeout,
        )
        .wait_for_state_with_cancel(
            || -> std::result::Result<Observation<Vec<WorkerFields>>, BoxError> {
                let listed = workers.list(cluster_id, target)?;
                let state = workers_state(&listed);
                Ok(Observation::new(listed, state))
            },
            cancel,
        )
        .map_err(|e| {
            ProviderError::wait(format!("error waiting for workers of cluster ({cluster_id})"))(
                e.map(Observed::Workers),
            )
        })
}

/// Wait until every worker id in `removed` is gone or marked deleted
pub fn wait_for_workers_deleted(
    workers: &dyn Workers,
    cluster_id: &str,
    removed: &BTreeSet<String>,
    target: &TargetHeader,
    settings: &WaitSettings,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<Vec<WorkerFields>> {
    settings
        .conf(
            format!("workers of cluster ({cluster_id}) to be deleted"),
            [STATE_DELETING],
            [STATE_DELETED],
            timeout,
        )
        .wait_for_state_with_cancel(
            || -> std::result::Result<Observation<Vec<WorkerFields>>, BoxError> {
                let listed = workers.list(cluster_id, target)?;
                let state = deletion_state(&listed, removed);
                Ok(Observation::new(listed, state))
            },
            cancel,
        )
        .map_err(|e| {
            ProviderError::wait(format!(
                "error waiting for worker removal in cluster ({cluster_id})"
            ))(e.map(Observed::Workers))
        })
}
