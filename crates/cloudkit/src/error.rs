//! Error types for remote calls, sessions and resource handlers.

use crate::api::{BillingOrderItem, ClusterFields, WorkerFields};
use converge::WaitError;
use thiserror::Error;

/// Error returned by a remote API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The remote service answered with a failure status
    #[error("request failed with status {status}: {message}")]
    RequestFailure {
        /// HTTP-style status code
        status: u16,
        /// Message from the remote service
        message: String,
    },

    /// The service has no endpoint in the configured region
    #[error("no service endpoint: {0}")]
    ServiceEndpoint(String),

    /// The request never got an answer
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// A 404 request failure
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::RequestFailure {
            status: 404,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The entity does not exist. Every other error is unexpected.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailure { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::ServiceEndpoint(_) | Self::Other(_) => false,
        }
    }
}

/// Result type for remote API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A capability that could not be configured when the session was built.
///
/// Computed once and returned on every accessor call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(
        "bluemix_api_key must be provided. Please see the documentation on how to configure it"
    )]
    EmptyBluemixCredentials,

    #[error(
        "softlayer_username and softlayer_api_key must be provided. Please see the documentation on how to configure them"
    )]
    EmptySoftLayerCredentials,

    #[error("container service for Kubernetes clusters doesn't exist in the region '{0}'")]
    ServiceUnavailableInRegion(String),
}

/// Last value seen by a wait that did not converge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Cluster(ClusterFields),
    Workers(Vec<WorkerFields>),
    Order(Option<BillingOrderItem>),
}

/// Errors raised by resource handlers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A connector failed for a reason other than a missing endpoint
    #[error("failed to configure {service}: {source}")]
    Configure {
        service: &'static str,
        source: ApiError,
    },

    #[error("{context}: {source}")]
    Api { context: String, source: ApiError },

    #[error("{context}: {source}")]
    Wait {
        context: String,
        source: WaitError<Observed>,
    },

    #[error(transparent)]
    Codec(#[from] statetree::Error),

    #[error("{0}")]
    NotFound(String),

    /// The remote state contradicts what the handler just did
    #[error("{0}")]
    Inconsistent(String),
}

impl ProviderError {
    /// Wrap an API error with context, for use with `map_err`
    pub fn api(context: impl Into<String>) -> impl FnOnce(ApiError) -> Self {
        let context = context.into();
        move |source| Self::Api { context, source }
    }

    /// Wrap a wait error with context, for use with `map_err`
    pub fn wait(context: impl Into<String>) -> impl FnOnce(WaitError<Observed>) -> Self {
        let context = context.into();
        move |source| Self::Wait { context, source }
    }

    /// The wait error behind this error, if any
    pub fn as_wait(&self) -> Option<&WaitError<Observed>> {
        match self {
            Self::Wait { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for resource handlers.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_404_is_not_found() {
        assert!(ApiError::not_found("cluster c1").is_not_found());
        assert!(
            !ApiError::RequestFailure {
                status: 403,
                message: "forbidden".to_string()
            }
            .is_not_found()
        );
        assert!(!ApiError::Transport("reset".to_string()).is_not_found());
    }

    #[test]
    fn test_retryable_statuses() {
        let status = |status| ApiError::RequestFailure {
            status,
            message: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(ApiError::Transport("timeout".to_string()).is_retryable());
    }

    #[test]
    fn test_context_wrapping() {
        let err = ProviderError::api("error deleting cluster")(ApiError::not_found("c1"));
        assert_eq!(
            err.to_string(),
            "error deleting cluster: request failed with status 404: c1"
        );
    }
}
