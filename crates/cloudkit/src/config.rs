//! Session credentials, retry knobs and wait settings.

use converge::StateChangeConf;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default infrastructure REST endpoint
pub const SOFTLAYER_REST_ENDPOINT: &str = "https://api.softlayer.com/rest/v3";

const MASK: &str = "********";

/// Credentials and transport settings for both remote services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub bluemix_api_key: String,
    pub region: String,
    pub bluemix_timeout_secs: u64,
    pub softlayer_username: String,
    pub softlayer_api_key: String,
    pub softlayer_endpoint_url: String,
    pub softlayer_timeout_secs: u64,
    /// Retries after the first attempt of a mutating call
    pub retry_count: u32,
    pub retry_delay_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bluemix_api_key: String::new(),
            region: "ng".to_string(),
            bluemix_timeout_secs: 60,
            softlayer_username: String::new(),
            softlayer_api_key: String::new(),
            softlayer_endpoint_url: SOFTLAYER_REST_ENDPOINT.to_string(),
            softlayer_timeout_secs: 60,
            retry_count: 3,
            retry_delay_secs: 5,
        }
    }
}

impl SessionConfig {
    pub fn has_bluemix_credentials(&self) -> bool {
        !self.bluemix_api_key.is_empty()
    }

    pub fn has_softlayer_credentials(&self) -> bool {
        !self.softlayer_username.is_empty() && !self.softlayer_api_key.is_empty()
    }

    /// Copy with every secret replaced by a mask
    #[must_use]
    pub fn masked(&self) -> Self {
        let mask = |secret: &str| {
            if secret.is_empty() {
                String::new()
            } else {
                MASK.to_string()
            }
        };
        Self {
            bluemix_api_key: mask(&self.bluemix_api_key),
            softlayer_api_key: mask(&self.softlayer_api_key),
            ..self.clone()
        }
    }
}

/// Which worker wait runs first after a worker diff is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerWaitOrder {
    /// Wait for the remaining workers to be ready, then for removals
    #[default]
    AvailabilityFirst,
    /// Wait for removals to finish, then for the remaining workers
    DeletionFirst,
}

/// Poll pacing shared by every wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub delay_secs: u64,
    pub min_poll_interval_secs: u64,
    pub max_poll_interval_secs: u64,
    /// Timeout of the product order wait
    pub order_timeout_minutes: u64,
    pub worker_wait_order: WorkerWaitOrder,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay_secs: 10,
            min_poll_interval_secs: 10,
            max_poll_interval_secs: 10,
            order_timeout_minutes: 10,
            worker_wait_order: WorkerWaitOrder::default(),
        }
    }
}

impl WaitSettings {
    /// No delays at all, for in-memory tests
    pub fn immediate() -> Self {
        Self {
            delay_secs: 0,
            min_poll_interval_secs: 0,
            max_poll_interval_secs: 0,
            ..Self::default()
        }
    }

    /// A wait configuration paced by these settings
    pub fn conf<P, S>(
        &self,
        description: impl Into<String>,
        pending: impl IntoIterator<Item = P>,
        target: impl IntoIterator<Item = S>,
        timeout: Duration,
    ) -> StateChangeConf
    where
        P: Into<String>,
        S: Into<String>,
    {
        StateChangeConf::new(description, pending, target)
            .timeout(timeout)
            .delay(Duration::from_secs(self.delay_secs))
            .min_poll_interval(Duration::from_secs(self.min_poll_interval_secs))
            .max_poll_interval(Duration::from_secs(self.max_poll_interval_secs))
    }

    pub fn order_timeout(&self) -> Duration {
        minutes(self.order_timeout_minutes)
    }
}

/// Whole-minute duration, saturating
pub(crate) const fn minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Everything the resource handlers need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub session: SessionConfig,
    pub wait: WaitSettings,
}

impl ProviderConfig {
    /// Copy safe to print
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            session: self.session.masked(),
            wait: self.wait.clone(),
        }
    }
}
