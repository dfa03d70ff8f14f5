//! Error types for waits.
//!
//! A wait that does not reach a target state still has useful information:
//! the last value the refresh function returned and the state it was in.
//! [`WaitError`] keeps both so callers can report exactly what got stuck.

use std::error::Error;
use std::time::Duration;

/// Boxed error returned by refresh functions.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Reasons a wait ended without reaching a target state.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<T> {
    /// The refresh function failed. Refresh errors are never retried.
    #[error("error refreshing {description}: {source}")]
    Refresh {
        /// What was being waited for
        description: String,
        /// Error returned by the refresh function
        #[source]
        source: BoxError,
    },

    /// The refresh function reported a state outside the pending and target sets.
    #[error(
        "unexpected state '{state}' while waiting for {description}, wanted one of: {}",
        .expected.join(", ")
    )]
    UnexpectedState {
        /// What was being waited for
        description: String,
        /// The unrecognized state label
        state: String,
        /// Every label the wait would have accepted
        expected: Vec<String>,
        /// Value observed together with the unrecognized state
        last: T,
    },

    /// The wall-clock deadline passed while the resource was still pending.
    #[error("timeout after {timeout:?} waiting for {description} (last state: '{last_state}')")]
    Timeout {
        /// What was being waited for
        description: String,
        /// The configured timeout
        timeout: Duration,
        /// Last observed state label
        last_state: String,
        /// Last observed value
        last: T,
    },

    /// The wait was cancelled.
    #[error("cancelled while waiting for {description}")]
    Cancelled {
        /// What was being waited for
        description: String,
        /// Last observed value, if any refresh completed before cancellation
        last: Option<T>,
    },
}

impl<T> WaitError<T> {
    /// The last value observed before the wait ended, if any.
    pub fn last_value(&self) -> Option<&T> {
        match self {
            Self::Refresh { .. } => None,
            Self::UnexpectedState { last, .. } | Self::Timeout { last, .. } => Some(last),
            Self::Cancelled { last, .. } => last.as_ref(),
        }
    }

    /// Consume the error and return the last observed value.
    pub fn into_last_value(self) -> Option<T> {
        match self {
            Self::Refresh { .. } => None,
            Self::UnexpectedState { last, .. } | Self::Timeout { last, .. } => Some(last),
            Self::Cancelled { last, .. } => last,
        }
    }

    /// The last observed state label, when the error carries one.
    pub fn last_state(&self) -> Option<&str> {
        match self {
            Self::UnexpectedState { state, .. } => Some(state),
            Self::Timeout { last_state, .. } => Some(last_state),
            Self::Refresh { .. } | Self::Cancelled { .. } => None,
        }
    }

    /// What was being waited for.
    pub fn description(&self) -> &str {
        match self {
            Self::Refresh { description, .. }
            | Self::UnexpectedState { description, .. }
            | Self::Timeout { description, .. }
            | Self::Cancelled { description, .. } => description,
        }
    }

    /// Check if the wait timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the wait was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Convert the carried value, keeping everything else.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WaitError<U> {
        match self {
            Self::Refresh {
                description,
                source,
            } => WaitError::Refresh {
                description,
                source,
            },
            Self::UnexpectedState {
                description,
                state,
                expected,
                last,
            } => WaitError::UnexpectedState {
                description,
                state,
                expected,
                last: f(last),
            },
            Self::Timeout {
                description,
                timeout,
                last_state,
                last,
            } => WaitError::Timeout {
                description,
                timeout,
                last_state,
                last: f(last),
            },
            Self::Cancelled { description, last } => WaitError::Cancelled {
                description,
                last: last.map(f),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_error() -> WaitError<u32> {
        WaitError::Timeout {
            description: "cluster c1".to_string(),
            timeout: Duration::from_secs(60),
            last_state: "provisioning".to_string(),
            last: 7,
        }
    }

    #[test]
    fn test_timeout_keeps_last_observation() {
        let err = timeout_error();
        assert!(err.is_timeout());
        assert_eq!(err.last_value(), Some(&7));
        assert_eq!(err.last_state(), Some("provisioning"));
        assert_eq!(
            err.to_string(),
            "timeout after 60s waiting for cluster c1 (last state: 'provisioning')"
        );
    }

    #[test]
    fn test_map_converts_value() {
        let mapped = timeout_error().map(|n| format!("worker-{n}"));
        assert_eq!(mapped.into_last_value(), Some("worker-7".to_string()));
    }

    #[test]
    fn test_refresh_error_exposes_source() {
        let err: WaitError<()> = WaitError::Refresh {
            description: "order 12".to_string(),
            source: "connection reset".into(),
        };
        assert!(err.source().is_some());
        assert!(err.last_value().is_none());
        assert_eq!(
            err.to_string(),
            "error refreshing order 12: connection reset"
        );
    }

    #[test]
    fn test_unexpected_state_lists_expected() {
        let err = WaitError::UnexpectedState {
            description: "cluster c1".to_string(),
            state: "corrupted".to_string(),
            expected: vec!["normal".to_string(), "provisioning".to_string()],
            last: (),
        };
        assert_eq!(err.last_state(), Some("corrupted"));
        assert!(err.to_string().contains("wanted one of: normal, provisioning"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_cancelled_message_and_boxing() {
        let err: WaitError<u32> = WaitError::Cancelled {
            description: "workers of c1".to_string(),
            last: Some(3),
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "cancelled while waiting for workers of c1");

        // Usable as a boxed error alongside other library errors
        let boxed: BoxError = Box::new(err);
        assert_eq!(boxed.to_string(), "cancelled while waiting for workers of c1");
    }
}
