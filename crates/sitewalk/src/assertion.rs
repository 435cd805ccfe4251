//! Assertions for scenarios.
//!
//! Scenario bodies return [`SitewalkResult`]; these helpers turn a false
//! expectation into [`SitewalkError::AssertionFailed`] so `?` carries it to
//! the harness like any other failure.

use crate::result::{SitewalkError, SitewalkResult};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// `Ok(())` if passed, `AssertionFailed` otherwise
    pub fn into_result(self) -> SitewalkResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(SitewalkError::assertion(self.message))
        }
    }
}

/// Fail with `message` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> SitewalkResult<()> {
    if condition {
        AssertionResult::pass()
    } else {
        AssertionResult::fail(message)
    }
    .into_result()
}

/// Fail unless `actual == expected`; `what` names the compared value
pub fn ensure_eq<T: PartialEq + Debug>(actual: &T, expected: &T, what: &str) -> SitewalkResult<()> {
    if actual == expected {
        AssertionResult::pass()
    } else {
        AssertionResult::fail(format!("{what}: expected {expected:?}, got {actual:?}"))
    }
    .into_result()
}

/// Fail unless `haystack` contains `needle`
pub fn ensure_contains(haystack: &str, needle: &str) -> SitewalkResult<()> {
    if haystack.contains(needle) {
        AssertionResult::pass()
    } else {
        AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
    }
    .into_result()
}

/// Fail unless `collection` has `expected` items
pub fn ensure_len<T>(collection: &[T], expected: usize, what: &str) -> SitewalkResult<()> {
    ensure_eq(&collection.len(), &expected, what)
}
