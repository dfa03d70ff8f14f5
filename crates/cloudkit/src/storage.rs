//! Object storage account resource handler.
//!
//! An account is identified by its username. Creation reuses an existing
//! hub account when there is one; otherwise it orders a new one and waits
//! for the order to complete.

use crate::api::{BillingOrderItem, OrderReceipt, OrderRequest, ProductOrders};
use crate::config::WaitSettings;
use crate::error::{Observed, ProviderError, Result};
use crate::retry::with_retry;
use crate::session::ClientSession;
use converge::{BoxError, CancelToken, Observation};
use log::info;

pub const ORDER_COMPLETE: &str = "complete";
pub const ORDER_IN_PROGRESS: &str = "in progress";

pub struct ObjectStorage {
    session: ClientSession,
    waits: WaitSettings,
    cancel: CancelToken,
}

impl ObjectStorage {
    pub fn new(session: ClientSession, waits: WaitSettings) -> Self {
        Self {
            session,
            waits,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Username of a usable account, ordering one if none exists
    pub fn create(&self) -> Result<String> {
        let storage = self.session.network_storage()?;
        let accounts = storage
            .list_hub_storage()
            .map_err(ProviderError::api("error listing object storage accounts"))?;
        if let Some(existing) = accounts.into_iter().next() {
            info!("Reusing object storage account {}", existing.username);
            return Ok(existing.username);
        }

        let orders = self.session.orders()?;
        let receipt = with_retry(self.session.retry_policy(), "place order", || {
            orders.place_order(&OrderRequest::object_storage())
        })
        .map_err(ProviderError::api("error placing object storage order"))?;
        info!("Placed object storage order {}", receipt.order_id);

        let item =
            wait_for_order_completion(orders.as_ref(), &receipt, &self.waits, &self.cancel)?;

        storage
            .find_by_billing_item(item.billing_item_id)
            .map_err(ProviderError::api("error retrieving object storage account"))?
            .into_iter()
            .next()
            .map(|account| account.username)
            .ok_or_else(|| {
                ProviderError::Inconsistent("failed to create object storage account".to_string())
            })
    }

    /// Username of the account, [`ProviderError::NotFound`] when gone
    pub fn read(&self, username: &str) -> Result<String> {
        let found = self
            .session
            .network_storage()?
            .find_by_username(username)
            .map_err(ProviderError::api(format!(
                "error retrieving object storage account {username}"
            )))?;

        found
            .into_iter()
            .find(|account| account.username == username)
            .map(|account| account.username)
            .ok_or_else(|| ProviderError::NotFound(format!("could not find account {username}")))
    }

    pub fn exists(&self, username: &str) -> Result<bool> {
        match self.read(username) {
            Ok(_) => Ok(true),
            Err(ProviderError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Poll a placed order until it completes and return its billing item
pub fn wait_for_order_completion(
    orders: &dyn ProductOrders,
    receipt: &OrderReceipt,
    settings: &WaitSettings,
    cancel: &CancelToken,
) -> Result<BillingOrderItem> {
    let item = settings
        .conf(
            format!("order {} to complete", receipt.order_id),
            ["", ORDER_IN_PROGRESS],
            [ORDER_COMPLETE],
            settings.order_timeout(),
        )
        .wait_for_state_with_cancel(
            || -> std::result::Result<Observation<Option<BillingOrderItem>>, BoxError> {
                let status = orders.billing_order_status(receipt)?;
                let state = if status.complete {
                    ORDER_COMPLETE
                } else {
                    ORDER_IN_PROGRESS
                };
                Ok(Observation::new(status.item, state))
            },
            cancel,
        )
        .map_err(|e| {
            ProviderError::wait(format!("error waiting for order {}", receipt.order_id))(
                e.map(Observed::Order),
            )
        })?;

    item.ok_or_else(|| {
        ProviderError::Inconsistent(format!(
            "order {} completed without a billing item",
            receipt.order_id
        ))
    })
}
