//! Container cluster resource handler.
//!
//! Creation and updates are asynchronous on the remote side. Every phase
//! that changes the cluster is followed by a wait that polls until the
//! service reports the change as settled; each wait gets its own
//! `wait_time_minutes` timeout.

pub mod types;
pub mod wait;

pub use types::{ClusterRecord, ClusterSpec, ClusterState, WorkerSpec};

use crate::api::{Webhook, WorkerFields, WorkerParam, Workers};
use crate::config::{WaitSettings, WorkerWaitOrder, minutes};
use crate::error::{ProviderError, Result};
use crate::retry::with_retry;
use crate::session::ClientSession;
use crate::target::TargetHeader;
use converge::CancelToken;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::time::Duration;
use wait::{
    STATE_DELETED, wait_for_cluster_available, wait_for_subnet_available,
    wait_for_workers_available, wait_for_workers_deleted,
};

/// Drives container clusters through create, read, update and delete
pub struct ClusterManager {
    session: ClientSession,
    waits: WaitSettings,
    cancel: CancelToken,
}

impl ClusterManager {
    pub fn new(session: ClientSession, waits: WaitSettings) -> Self {
        Self {
            session,
            waits,
            cancel: CancelToken::new(),
        }
    }

    /// Stop pending waits when `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create a cluster and wait until it, its workers and its subnets are
    /// usable. Worker ids are filled in by position.
    pub fn create(&self, spec: &ClusterSpec) -> Result<ClusterRecord> {
        let clusters = self.session.clusters()?;
        let workers = self.session.workers()?;
        let target = &spec.target;
        let timeout = minutes(spec.wait_time_minutes);

        let request = spec.create_request();
        let handle = with_retry(self.session.retry_policy(), "create cluster", || {
            clusters.create(&request, target)
        })
        .map_err(ProviderError::api("error creating cluster"))?;
        let id = handle.id;
        info!("Created cluster {} ({id})", spec.name);

        wait_for_cluster_available(
            clusters.as_ref(),
            &id,
            target,
            &self.waits,
            timeout,
            &self.cancel,
        )?;
        wait_for_workers_available(
            workers.as_ref(),
            &id,
            target,
            &self.waits,
            timeout,
            &self.cancel,
        )?;

        self.add_subnets(&id, spec.subnet_ids.iter(), target, timeout)?;
        self.add_webhooks(&id, spec.webhooks.iter(), target)?;

        let listed: Vec<WorkerFields> = workers
            .list(&id, target)
            .map_err(ProviderError::api(format!("error listing workers of cluster ({id})")))?
            .into_iter()
            .filter(|w| w.state != STATE_DELETED)
            .collect();
        if listed.len() < spec.workers.len() {
            return Err(ProviderError::Inconsistent(format!(
                "cluster ({id}) reports {} workers, {} were declared",
                listed.len(),
                spec.workers.len()
            )));
        }

        let mut created = spec.clone();
        for (worker, fields) in created.workers.iter_mut().zip(&listed) {
            worker.id.clone_from(&fields.id);
        }

        let state = self.read(&id, target)?;
        Ok(ClusterRecord {
            id,
            spec: created,
            state,
        })
    }

    /// Computed attributes of an existing cluster
    pub fn read(&self, id: &str, target: &TargetHeader) -> Result<ClusterState> {
        let fields = self
            .session
            .clusters()?
            .find(id, target)
            .map_err(ProviderError::api(format!("error retrieving cluster ({id})")))?;
        Ok(ClusterState::from(&fields))
    }

    /// Apply the difference between `prior` and `desired`.
    ///
    /// Workers are matched by name. Subnets and webhooks can only be added;
    /// removals are reported and left in place.
    pub fn update(
        &self,
        id: &str,
        prior: &ClusterSpec,
        desired: &ClusterSpec,
    ) -> Result<ClusterRecord> {
        let target = &desired.target;
        let timeout = minutes(desired.wait_time_minutes);
        let mut updated = desired.clone();

        if prior.workers != desired.workers {
            updated.workers =
                self.update_workers(id, &prior.workers, &desired.workers, target, timeout)?;
        }

        let new_webhooks = desired
            .webhooks
            .iter()
            .filter(|hook| !prior.webhooks.contains(hook));
        self.add_webhooks(id, new_webhooks, target)?;
        for hook in prior.webhooks.iter().filter(|h| !desired.webhooks.contains(h)) {
            warn!(
                "Webhook {} cannot be removed from cluster ({id}); it stays in place",
                hook.url
            );
        }

        let new_subnets = desired
            .subnet_ids
            .iter()
            .filter(|subnet| !prior.subnet_ids.contains(subnet));
        self.add_subnets(id, new_subnets, target, timeout)?;
        for subnet in prior.subnet_ids.iter().filter(|s| !desired.subnet_ids.contains(s)) {
            warn!("Subnet {subnet} cannot be removed from cluster ({id}); it stays in place");
        }

        let state = self.read(id, target)?;
        Ok(ClusterRecord {
            id: id.to_string(),
            spec: updated,
            state,
        })
    }

    pub fn delete(&self, id: &str, target: &TargetHeader) -> Result<()> {
        let clusters = self.session.clusters()?;
        with_retry(self.session.retry_policy(), "delete cluster", || {
            clusters.delete(id, target)
        })
        .map_err(ProviderError::api(format!("error deleting cluster ({id})")))?;
        info!("Deleted cluster ({id})");
        Ok(())
    }

    /// Whether the cluster still exists. Only a 404 means it does not.
    pub fn exists(&self, id: &str, target: &TargetHeader) -> Result<bool> {
        match self.session.clusters()?.find(id, target) {
            Ok(fields) => Ok(fields.id == id),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(ProviderError::api("error communicating with the API")(e)),
        }
    }

    fn update_workers(
        &self,
        id: &str,
        prior: &[WorkerSpec],
        desired: &[WorkerSpec],
        target: &TargetHeader,
        timeout: Duration,
    ) -> Result<Vec<WorkerSpec>> {
        let workers = self.session.workers()?;
        let retry = self.session.retry_policy();
        let mut applied: Vec<WorkerSpec> = Vec::with_capacity(desired.len());

        for wanted in desired {
            match prior.iter().find(|old| old.name == wanted.name) {
                Some(old) if old.action != wanted.action => {
                    let params = WorkerParam::action(&wanted.action);
                    with_retry(retry, "update worker", || {
                        workers.update(id, &old.id, &params, target)
                    })
                    .map_err(ProviderError::api(format!("error updating worker {}", old.name)))?;
                    debug!("Applied {} to worker {} ({})", wanted.action, old.name, old.id);
                    applied.push(wanted.clone().with_id(&old.id));
                }
                Some(old) => applied.push(old.clone()),
                None => {
                    with_retry(retry, "add worker", || {
                        workers.add(id, &WorkerParam::add(), target)
                    })
                    .map_err(ProviderError::api(format!("error adding worker {}", wanted.name)))?;
                    let worker_id =
                        discover_worker_id(workers.as_ref(), id, target, prior, &applied)?;
                    info!("Added worker {} ({worker_id})", wanted.name);
                    applied.push(wanted.clone().with_id(worker_id));
                }
            }
        }

        let mut removed = BTreeSet::new();
        for old in prior.iter().filter(|old| !desired.iter().any(|w| w.name == old.name)) {
            with_retry(retry, "delete worker", || workers.delete(id, &old.id, target))
                .map_err(ProviderError::api(format!("error deleting worker {}", old.name)))?;
            info!("Deleting worker {} ({})", old.name, old.id);
            removed.insert(old.id.clone());
        }

        let wait_available = || {
            wait_for_workers_available(
                workers.as_ref(),
                id,
                target,
                &self.waits,
                timeout,
                &self.cancel,
            )
            .map(drop)
        };
        let wait_deleted = || {
            if removed.is_empty() {
                return Ok(());
            }
            wait_for_workers_deleted(
                workers.as_ref(),
                id,
                &removed,
                target,
                &self.waits,
                timeout,
                &self.cancel,
            )
            .map(drop)
        };

        match self.waits.worker_wait_order {
            WorkerWaitOrder::AvailabilityFirst => {
                wait_available()?;
                wait_deleted()?;
            }
            WorkerWaitOrder::DeletionFirst => {
                wait_deleted()?;
                wait_available()?;
            }
        }

        Ok(applied)
    }

    fn add_subnets<'s>(
        &self,
        id: &str,
        subnet_ids: impl Iterator<Item = &'s String>,
        target: &TargetHeader,
        timeout: Duration,
    ) -> Result<()> {
        let mut added = false;
        for subnet in subnet_ids.filter(|s| !s.is_empty()) {
            let subnets = self.session.subnets()?;
            with_retry(self.session.retry_policy(), "add subnet", || {
                subnets.add(id, subnet, target)
            })
            .map_err(ProviderError::api(format!("error adding subnet {subnet}")))?;
            debug!("Attached subnet {subnet} to cluster ({id})");
            added = true;
        }

        if added {
            let clusters = self.session.clusters()?;
            wait_for_subnet_available(
                clusters.as_ref(),
                id,
                target,
                &self.waits,
                timeout,
                &self.cancel,
            )?;
        }
        Ok(())
    }

    fn add_webhooks<'w>(
        &self,
        id: &str,
        webhooks: impl Iterator<Item = &'w Webhook>,
        target: &TargetHeader,
    ) -> Result<()> {
        for hook in webhooks {
            let client = self.session.webhooks()?;
            with_retry(self.session.retry_policy(), "add webhook", || {
                client.add(id, hook, target)
            })
            .map_err(ProviderError::api(format!("error adding webhook {}", hook.url)))?;
        }
        Ok(())
    }
}

/// Id of a worker that was just added: the first listed worker that is not
/// deleted and was neither known before nor already claimed.
fn discover_worker_id(
    workers: &dyn Workers,
    cluster_id: &str,
    target: &TargetHeader,
    prior: &[WorkerSpec],
    claimed: &[WorkerSpec],
) -> Result<String> {
    let listed = workers
        .list(cluster_id, target)
        .map_err(ProviderError::api(format!("error listing workers of cluster ({cluster_id})")))?;

    listed
        .into_iter()
        .find(|w| {
            w.state != STATE_DELETED
                && !prior.iter().any(|p| p.id == w.id)
                && !claimed.iter().any(|c| c.id == w.id)
        })
        .map(|w| w.id)
        .ok_or_else(|| {
            ProviderError::Inconsistent(format!(
                "unable to find the id of the worker added to cluster ({cluster_id})"
            ))
        })
}
