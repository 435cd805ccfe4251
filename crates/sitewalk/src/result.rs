//! Result and error types for Sitewalk.

use thiserror::Error;

/// Result type for Sitewalk operations
pub type SitewalkResult<T> = Result<T, SitewalkError>;

/// Errors that can occur while driving pages and running scenarios
#[derive(Debug, Error)]
pub enum SitewalkError {
    /// Locator resolved to zero elements
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// A previously resolved element no longer belongs to the current DOM
    #[error("Stale element reference: {handle}")]
    StaleElement {
        /// Driver handle of the stale element
        handle: String,
    },

    /// A wait or readiness predicate did not hold in time
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Navigation landed somewhere other than the expected page
    #[error("Expected to arrive at {expected}, but the browser is at {actual}")]
    UnexpectedDestination {
        /// Expected destination page
        expected: String,
        /// URL actually reached
        actual: String,
    },

    /// Operation called in the wrong page state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Scenario expectation was false
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Error reported by the browser driver
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The driver cannot perform the requested operation
    #[error("Unsupported by driver: {message}")]
    Unsupported {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// URL template could not be rendered or matched
    #[error("URL template {template}: {message}")]
    UrlTemplate {
        /// Template being rendered
        template: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SitewalkError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Lookup failures are the only errors polling treats as "not yet"
    #[must_use]
    pub const fn is_lookup_failure(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. } | Self::StaleElement { .. })
    }

    /// Whether this is a scenario-level assertion failure
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failures() {
        let not_found = SitewalkError::ElementNotFound {
            locator: "css=.missing".into(),
        };
        let stale = SitewalkError::StaleElement {
            handle: "e-1".into(),
        };
        assert!(not_found.is_lookup_failure());
        assert!(stale.is_lookup_failure());
        assert!(!SitewalkError::driver("boom").is_lookup_failure());
        assert!(!SitewalkError::Timeout {
            ms: 10,
            waited_for: "x".into()
        }
        .is_lookup_failure());
    }

    #[test]
    fn test_display_messages() {
        let err = SitewalkError::Timeout {
            ms: 1000,
            waited_for: "WebHome loaded".into(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 1000ms waiting for WebHome loaded"
        );

        let err = SitewalkError::UnexpectedDestination {
            expected: "Profile".into(),
            actual: "https://accounts.example.org/login".into(),
        };
        assert!(err.to_string().contains("Profile"));
        assert!(err.to_string().contains("/login"));
    }

    #[test]
    fn test_assertion_constructor() {
        let err = SitewalkError::assertion("title mismatch");
        assert!(err.is_assertion());
        assert_eq!(err.to_string(), "Assertion failed: title mismatch");
    }
}
