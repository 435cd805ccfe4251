//! Wait Mechanisms
//!
//! The single polling primitive every page and region uses to let the UI
//! settle. Nothing in the crate sleeps for a fixed duration; readiness is
//! always expressed as a predicate polled at a fixed interval with a bounded
//! timeout.

use crate::result::{SitewalkError, SitewalkResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Document load states, as reported by `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// DOM parsed, sub-resources may still be loading
    DomContentLoaded,
    /// Document and sub-resources finished loading
    #[default]
    Load,
}

impl LoadState {
    /// The `document.readyState` value that signals this state
    #[must_use]
    pub const fn ready_state(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "interactive",
            Self::Load => "complete",
        }
    }

    /// Whether a reported `document.readyState` satisfies this state
    #[must_use]
    pub fn is_reached(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load => ready_state == "complete",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ready_state())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
    /// Number of times the condition was evaluated
    pub polls: u32,
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Bounded poller for UI conditions
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The options this waiter polls with
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll until `probe` yields a value.
    ///
    /// `Ok(None)` and lookup failures (element not found, stale element) mean
    /// "not yet". Any other error ends the wait immediately. The condition is
    /// always evaluated at least once, and the call returns no later than one
    /// poll interval past the timeout.
    pub fn wait_for_value<T, F>(
        &self,
        waited_for: &str,
        mut probe: F,
    ) -> SitewalkResult<(T, WaitResult)>
    where
        F: FnMut() -> SitewalkResult<Option<T>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let poll_interval = self.options.poll_interval();
        let mut polls = 0_u32;

        loop {
            polls += 1;
            match probe() {
                Ok(Some(value)) => {
                    let result = WaitResult {
                        elapsed: start.elapsed(),
                        waited_for: waited_for.to_string(),
                        polls,
                    };
                    return Ok((value, result));
                }
                Ok(None) => {}
                Err(e) if e.is_lookup_failure() => {
                    tracing::trace!(waited_for, error = %e, "condition not ready");
                }
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::debug!(waited_for, polls, "wait timed out");
                return Err(SitewalkError::Timeout {
                    ms: self.options.timeout_ms,
                    waited_for: waited_for.to_string(),
                });
            }
            std::thread::sleep(poll_interval.min(timeout - elapsed));
        }
    }

    /// Poll a fallible predicate until it returns `true`
    pub fn wait_until<F>(&self, waited_for: &str, mut predicate: F) -> SitewalkResult<WaitResult>
    where
        F: FnMut() -> SitewalkResult<bool>,
    {
        self.wait_for_value(waited_for, || Ok(predicate()?.then_some(())))
            .map(|((), result)| result)
    }

    /// Poll an infallible predicate until it returns `true`
    pub fn wait_for_function<F>(
        &self,
        waited_for: &str,
        mut predicate: F,
    ) -> SitewalkResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        self.wait_until(waited_for, || Ok(predicate()))
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for a condition with the default poll interval
pub fn wait_until<F>(predicate: F, timeout_ms: u64) -> SitewalkResult<()>
where
    F: FnMut() -> bool,
{
    let waiter = Waiter::with_options(WaitOptions::new().with_timeout(timeout_ms));
    waiter.wait_for_function("custom function", predicate)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_ready_state_values() {
            assert_eq!(LoadState::Load.ready_state(), "complete");
            assert_eq!(LoadState::DomContentLoaded.ready_state(), "interactive");
        }

        #[test]
        fn test_is_reached() {
            assert!(LoadState::Load.is_reached("complete"));
            assert!(!LoadState::Load.is_reached("interactive"));
            assert!(LoadState::DomContentLoaded.is_reached("interactive"));
            assert!(LoadState::DomContentLoaded.is_reached("complete"));
            assert!(!LoadState::DomContentLoaded.is_reached("loading"));
        }

        #[test]
        fn test_default() {
            assert_eq!(LoadState::default(), LoadState::Load);
        }
    }

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_chained() {
            let opts = WaitOptions::new().with_timeout(5000).with_poll_interval(100);
            assert_eq!(opts.timeout(), Duration::from_millis(5000));
            assert_eq!(opts.poll_interval(), Duration::from_millis(100));
        }

        #[test]
        fn test_partial_deserialize_keeps_defaults() {
            let opts: WaitOptions = serde_json::from_str(r#"{"timeout_ms": 1200}"#).unwrap();
            assert_eq!(opts.timeout_ms, 1200);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }
    }

    mod waiter_tests {
        use super::*;
        use std::cell::Cell;

        fn fast(timeout_ms: u64) -> Waiter {
            Waiter::with_options(WaitOptions::new().with_timeout(timeout_ms).with_poll_interval(10))
        }

        #[test]
        fn test_immediate_success() {
            let result = fast(100).wait_for_function("always", || true).unwrap();
            assert_eq!(result.polls, 1);
            assert_eq!(result.waited_for, "always");
        }

        #[test]
        fn test_returns_once_satisfied() {
            let start = Instant::now();
            let ready_at = start + Duration::from_millis(150);
            let result = fast(5000)
                .wait_for_function("becomes true", || Instant::now() >= ready_at)
                .unwrap();
            assert!(result.elapsed >= Duration::from_millis(150));
            assert!(start.elapsed() < Duration::from_millis(2000));
        }

        #[test]
        fn test_timeout_is_bounded() {
            let start = Instant::now();
            let err = fast(200).wait_for_function("never", || false).unwrap_err();
            let elapsed = start.elapsed();
            match err {
                SitewalkError::Timeout { ms, waited_for } => {
                    assert_eq!(ms, 200);
                    assert_eq!(waited_for, "never");
                }
                other => panic!("Expected Timeout error, got {other:?}"),
            }
            assert!(elapsed >= Duration::from_millis(200));
            assert!(elapsed < Duration::from_millis(800));
        }

        #[test]
        fn test_lookup_failures_mean_not_yet() {
            let calls = Cell::new(0);
            let result = fast(1000).wait_until("element appears", || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(SitewalkError::ElementNotFound {
                        locator: "css=.late".into(),
                    })
                } else {
                    Ok(true)
                }
            });
            assert!(result.is_ok());
            assert_eq!(calls.get(), 3);
        }

        #[test]
        fn test_other_errors_propagate_immediately() {
            let calls = Cell::new(0);
            let err = fast(1000)
                .wait_until("driver dies", || {
                    calls.set(calls.get() + 1);
                    Err(SitewalkError::driver("session closed"))
                })
                .unwrap_err();
            assert!(matches!(err, SitewalkError::Driver { .. }));
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_wait_for_value() {
            let calls = Cell::new(0);
            let (value, result) = fast(1000)
                .wait_for_value("third poll", || {
                    calls.set(calls.get() + 1);
                    Ok((calls.get() == 3).then_some("ready"))
                })
                .unwrap();
            assert_eq!(value, "ready");
            assert_eq!(result.polls, 3);
        }

        #[test]
        fn test_zero_timeout_checks_once() {
            let calls = Cell::new(0);
            let err = fast(0).wait_for_function("once", || {
                calls.set(calls.get() + 1);
                false
            });
            assert!(err.is_err());
            assert_eq!(calls.get(), 1);
        }
    }

    mod convenience_tests {
        use super::*;

        #[test]
        fn test_wait_until_success() {
            assert!(wait_until(|| true, 100).is_ok());
        }

        #[test]
        fn test_wait_until_timeout() {
            assert!(matches!(
                wait_until(|| false, 100),
                Err(SitewalkError::Timeout { ms: 100, .. })
            ));
        }
    }
}
