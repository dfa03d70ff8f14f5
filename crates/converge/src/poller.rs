//! Wait-for-state engine
//!
//! A [`StateChangeConf`] describes one wait: which state labels mean "keep
//! polling", which mean "done", how long to wait in total and how often to
//! poll. The refresh function is called immediately, then after each sleep,
//! until its label lands in the target set, an error occurs, an unknown label
//! appears, the deadline passes or the wait is cancelled.

use crate::cancel::CancelToken;
use crate::error::{BoxError, WaitError};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Default wait before the second refresh
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Default floor for the interval between refreshes
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default ceiling for the backoff between refreshes
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default wall-clock budget for one wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Result of one refresh: the observed value and its state label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<T> {
    pub value: T,
    pub state: String,
}

impl<T> Observation<T> {
    pub fn new(value: T, state: impl Into<String>) -> Self {
        Self {
            value,
            state: state.into(),
        }
    }
}

/// Configuration for one wait.
///
/// Created per wait call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// Human-readable subject of the wait, used in logs and errors
    pub description: String,
    /// Labels that mean "not ready yet"
    pub pending: BTreeSet<String>,
    /// Labels that end the wait successfully
    pub target: BTreeSet<String>,
    /// Wall-clock budget measured from the start of the wait call
    pub timeout: Duration,
    /// Interval before the second refresh
    pub delay: Duration,
    /// Interval floor
    pub min_poll_interval: Duration,
    /// Backoff ceiling. The effective ceiling is never below `delay`.
    pub max_poll_interval: Duration,
}

impl StateChangeConf {
    pub fn new<P, S>(
        description: impl Into<String>,
        pending: impl IntoIterator<Item = P>,
        target: impl IntoIterator<Item = S>,
    ) -> Self
    where
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            description: description.into(),
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub const fn min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn max_poll_interval(mut self, interval: Duration) -> Self {
        self.max_poll_interval = interval;
        self
    }

    /// Every label the wait accepts, sorted
    pub fn expected(&self) -> Vec<String> {
        self.pending.union(&self.target).cloned().collect()
    }

    /// Interval before the second refresh
    pub fn first_interval(&self) -> Duration {
        self.delay.max(self.min_poll_interval)
    }

    /// Interval following `current`: doubled, capped, floored
    pub fn next_interval(&self, current: Duration) -> Duration {
        let ceiling = self.max_poll_interval.max(self.delay);
        current
            .saturating_mul(2)
            .min(ceiling)
            .max(self.min_poll_interval)
    }

    /// Poll `refresh` until its state lands in the target set.
    pub fn wait_for_state<T, F>(&self, refresh: F) -> Result<T, WaitError<T>>
    where
        F: FnMut() -> Result<Observation<T>, BoxError>,
    {
        self.wait_for_state_with_cancel(refresh, &CancelToken::new())
    }

    /// Poll `refresh` until its state lands in the target set, stopping early
    /// when `cancel` fires.
    ///
    /// No refresh is issued once cancellation has been observed.
    pub fn wait_for_state_with_cancel<T, F>(
        &self,
        mut refresh: F,
        cancel: &CancelToken,
    ) -> Result<T, WaitError<T>>
    where
        F: FnMut() -> Result<Observation<T>, BoxError>,
    {
        if cancel.is_cancelled() {
            return Err(WaitError::Cancelled {
                description: self.description.clone(),
                last: None,
            });
        }

        let started = Instant::now();
        // None means the deadline is beyond what Instant can represent
        let deadline = started.checked_add(self.timeout);
        let mut interval = self.first_interval();
        let mut polls: u32 = 0;

        info!(
            "Waiting for {} (target: {:?}, timeout: {:?})",
            self.description, self.target, self.timeout
        );

        loop {
            polls += 1;
            let Observation { value, state } =
                refresh().map_err(|source| WaitError::Refresh {
                    description: self.description.clone(),
                    source,
                })?;

            if self.target.contains(&state) {
                info!(
                    "{} reached '{}' after {} poll(s) in {:?}",
                    self.description,
                    state,
                    polls,
                    started.elapsed()
                );
                return Ok(value);
            }

            if !self.pending.contains(&state) {
                return Err(WaitError::UnexpectedState {
                    description: self.description.clone(),
                    state,
                    expected: self.expected(),
                    last: value,
                });
            }

            let sleep_for = match deadline {
                Some(deadline) => interval.min(deadline.saturating_duration_since(Instant::now())),
                None => interval,
            };
            debug!(
                "{} is '{}' (poll {}), next refresh in {:?}",
                self.description, state, polls, sleep_for
            );

            if cancel.sleep(sleep_for) {
                debug!("{} cancelled after {} poll(s)", self.description, polls);
                return Err(WaitError::Cancelled {
                    description: self.description.clone(),
                    last: Some(value),
                });
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(
                    "Timed out after {:?} waiting for {} (last state: '{}')",
                    self.timeout, self.description, state
                );
                return Err(WaitError::Timeout {
                    description: self.description.clone(),
                    timeout: self.timeout,
                    last_state: state,
                    last: value,
                });
            }

            interval = self.next_interval(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::thread;

    fn fast_conf(pending: &[&str], target: &[&str]) -> StateChangeConf {
        StateChangeConf::new("test resource", pending.iter().copied(), target.iter().copied())
            .delay(Duration::from_millis(10))
            .min_poll_interval(Duration::from_millis(10))
            .max_poll_interval(Duration::from_millis(10))
            .timeout(Duration::from_secs(5))
    }

    /// Refresh function replaying a fixed label sequence; the last label repeats
    fn scripted<'a>(
        labels: &'a [&'a str],
        calls: &'a Cell<usize>,
    ) -> impl FnMut() -> Result<Observation<usize>, BoxError> + 'a {
        move || {
            let n = calls.get();
            calls.set(n + 1);
            let label = labels[n.min(labels.len() - 1)];
            Ok(Observation::new(n + 1, label))
        }
    }

    #[test]
    fn test_fast_path_returns_without_sleeping() {
        let conf = StateChangeConf::new("cluster c1", ["provisioning"], ["normal"]);
        let calls = Cell::new(0);
        let started = Instant::now();

        let value = conf.wait_for_state(scripted(&["normal"], &calls)).unwrap();

        assert_eq!(value, 1);
        assert_eq!(calls.get(), 1);
        // Default delay is 10s, so anything close to it means we slept
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_timeout_carries_last_observation() {
        let delay = Duration::from_millis(30);
        let conf = StateChangeConf::new("cluster c1", ["provisioning"], ["normal"])
            .delay(delay)
            .min_poll_interval(delay)
            .timeout(delay * 2);
        let calls = Cell::new(0);

        let err = conf
            .wait_for_state(scripted(&["provisioning"], &calls))
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(calls.get() <= 3, "polled {} times", calls.get());
        assert_eq!(err.last_value(), Some(&calls.get()));
        assert_eq!(err.last_state(), Some("provisioning"));
    }

    #[test]
    fn test_refresh_error_is_not_retried() {
        let conf = fast_conf(&["provisioning"], &["normal"]);
        let calls = Cell::new(0);
        let started = Instant::now();

        let err = conf
            .wait_for_state(|| -> Result<Observation<()>, BoxError> {
                calls.set(calls.get() + 1);
                Err("cluster not found".into())
            })
            .unwrap_err();

        assert!(matches!(err, WaitError::Refresh { .. }));
        assert_eq!(calls.get(), 1);
        assert!(started.elapsed() < Duration::from_millis(10));
        assert!(err.to_string().contains("cluster not found"));
    }

    #[test]
    fn test_unrecognized_state_is_rejected() {
        let conf = fast_conf(&["provisioning"], &["normal"]);
        let calls = Cell::new(0);

        let err = conf
            .wait_for_state(scripted(&["corrupted"], &calls))
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        match err {
            WaitError::UnexpectedState {
                state, expected, ..
            } => {
                assert_eq!(state, "corrupted");
                assert_eq!(expected, vec!["normal", "provisioning"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pending_sequence_converges_after_three_calls() {
        let conf = fast_conf(&["retry", "provisioning"], &["normal"]);
        let calls = Cell::new(0);

        let value = conf
            .wait_for_state(scripted(&["provisioning", "provisioning", "normal"], &calls))
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_only_target_terminates_successfully() {
        // Switching between pending labels keeps polling
        let conf = fast_conf(&["retry", "provisioning"], &["normal"]);
        let calls = Cell::new(0);

        let value = conf
            .wait_for_state(scripted(&["retry", "provisioning", "retry", "normal"], &calls))
            .unwrap();

        assert_eq!(value, 4);
    }

    #[test]
    fn test_deletion_marker_as_target() {
        let conf = fast_conf(&["deleting"], &["deleted"]);
        let calls = Cell::new(0);

        let value = conf
            .wait_for_state(scripted(&["deleting", "deleted"], &calls))
            .unwrap();

        assert_eq!(value, 2);
    }

    #[test]
    fn test_deletion_marker_not_configured_is_unexpected() {
        let conf = fast_conf(&["provisioning"], &["normal"]);
        let calls = Cell::new(0);

        let err = conf
            .wait_for_state(scripted(&["provisioning", "deleted"], &calls))
            .unwrap_err();

        assert_eq!(err.last_state(), Some("deleted"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cancel_stops_polling_promptly() {
        let conf = StateChangeConf::new("cluster c1", ["provisioning"], ["normal"])
            .delay(Duration::from_secs(30))
            .min_poll_interval(Duration::from_secs(30));
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        let calls = Cell::new(0);
        let started = Instant::now();
        let err = conf
            .wait_for_state_with_cancel(scripted(&["provisioning"], &calls), &cancel)
            .unwrap_err();
        handle.join().unwrap();

        assert!(err.is_cancelled());
        assert_eq!(calls.get(), 1);
        assert_eq!(err.last_value(), Some(&1));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancelled_before_start_never_refreshes() {
        let conf = fast_conf(&["provisioning"], &["normal"]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = Cell::new(0);

        let err = conf
            .wait_for_state_with_cancel(scripted(&["normal"], &calls), &cancel)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(err.last_value().is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_interval_backoff() {
        let conf = StateChangeConf::new("x", ["a"], ["b"])
            .delay(Duration::from_secs(2))
            .min_poll_interval(Duration::from_secs(1))
            .max_poll_interval(Duration::from_secs(8));

        let first = conf.first_interval();
        assert_eq!(first, Duration::from_secs(2));
        let second = conf.next_interval(first);
        assert_eq!(second, Duration::from_secs(4));
        let third = conf.next_interval(second);
        assert_eq!(third, Duration::from_secs(8));
        assert_eq!(conf.next_interval(third), Duration::from_secs(8));
    }

    #[test]
    fn test_interval_floor_and_delay_ceiling() {
        // The floor wins over the delay, and the ceiling never drops below the delay
        let conf = StateChangeConf::new("x", ["a"], ["b"])
            .delay(Duration::from_secs(10))
            .min_poll_interval(Duration::from_secs(15))
            .max_poll_interval(Duration::from_secs(1));

        assert_eq!(conf.first_interval(), Duration::from_secs(15));
        assert_eq!(
            conf.next_interval(Duration::from_secs(15)),
            Duration::from_secs(15)
        );

        let defaults = StateChangeConf::new("x", ["a"], ["b"]);
        assert_eq!(defaults.first_interval(), Duration::from_secs(10));
        assert_eq!(
            defaults.next_interval(Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }
}
