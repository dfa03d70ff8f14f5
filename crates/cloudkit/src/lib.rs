//! # Cloudkit
//!
//! Resource handlers for a container service and an infrastructure
//! ordering service. Handlers talk to the remote side only through the
//! capability traits in [`api`], then use [`converge`] to wait until the
//! remote state settles.
//!
//! ## Core Concepts
//!
//! - **Session**: capability handles built once by a [`Connector`];
//!   a capability that cannot be configured keeps returning its error
//! - **Handler**: [`ClusterManager`] and [`ObjectStorage`] implement
//!   create, read, update, delete and exists for one resource type
//! - **Wait**: every asynchronous phase is followed by a state wait with
//!   its own timeout
//!
//! ## Example
//!
//! ```ignore
//! use cloudkit::{ClientSession, ClusterManager, ProviderConfig};
//!
//! let config = ProviderConfig::default();
//! let session = ClientSession::new(&config.session, &connector)?;
//! let clusters = ClusterManager::new(session, config.wait);
//! let record = clusters.create(&spec)?;
//! println!("{} is at {}", record.id, record.state.server_url);
//! ```

pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod retry;
pub mod session;
pub mod storage;
pub mod target;

#[cfg(test)]
mod fake;

pub use cluster::{ClusterManager, ClusterRecord, ClusterSpec, ClusterState, WorkerSpec};
pub use config::{ProviderConfig, SOFTLAYER_REST_ENDPOINT, SessionConfig, WaitSettings, WorkerWaitOrder};
pub use error::{ApiError, ApiResult, Observed, ProviderError, Result, SessionError};
pub use retry::{RetryPolicy, with_retry};
pub use session::{ClientSession, Connector};
pub use storage::ObjectStorage;
pub use target::TargetHeader;
