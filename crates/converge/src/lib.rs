//! # Converge
//!
//! Polling primitives for driving asynchronously provisioned remote
//! resources to a desired observable state.
//!
//! ## Core Concepts
//!
//! - **StateChangeConf**: One wait. Pending and target state labels, a
//!   wall-clock timeout and the poll interval policy
//! - **Observation**: What a refresh function saw: a value plus its state label
//! - **WaitError**: Why a wait ended without reaching a target state. Carries
//!   the last observed value so callers can report where a resource got stuck
//! - **CancelToken**: Aborts a wait between polls or in the middle of a sleep
//! - **wait_all**: Converges several independent resources in parallel
//!
//! ## Example
//!
//! ```ignore
//! use converge::{Observation, StateChangeConf};
//! use std::time::Duration;
//!
//! let conf = StateChangeConf::new("cluster c1", ["retry", "provisioning"], ["normal"])
//!     .timeout(Duration::from_secs(90 * 60))
//!     .delay(Duration::from_secs(10))
//!     .min_poll_interval(Duration::from_secs(10));
//!
//! let cluster = conf.wait_for_state(|| {
//!     let fields = api.find("c1")?;
//!     let state = if fields.state == "normal" { "normal" } else { "provisioning" };
//!     Ok(Observation::new(fields, state))
//! })?;
//! ```
//!
//! The poller knows nothing about specific resources. States such as
//! "deleted" only have meaning through the pending and target sets the
//! caller configures.

pub mod cancel;
pub mod error;
pub mod executor;
pub mod poller;

pub use cancel::CancelToken;
pub use error::{BoxError, WaitError};
pub use executor::{WaitJob, wait_all};
pub use poller::{
    DEFAULT_DELAY, DEFAULT_MAX_POLL_INTERVAL, DEFAULT_MIN_POLL_INTERVAL, DEFAULT_TIMEOUT,
    Observation, StateChangeConf,
};
