//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("{failed} scenario(s) failed")]
    ScenariosFailed {
        /// Number of failed scenarios
        failed: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("Serialization error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON output error
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sitewalk library error
    #[error("Sitewalk error: {0}")]
    Sitewalk(#[from] sitewalk::SitewalkError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_scenarios_failed() {
        let err = CliError::ScenariosFailed { failed: 2 };
        assert_eq!(err.to_string(), "2 scenario(s) failed");
    }

    #[test]
    fn test_json_error_from() {
        let err: CliError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, CliError::Json(_)));
        assert!(err.to_string().starts_with("JSON output error"));
    }

    #[test]
    fn test_library_error_from() {
        let err: CliError = sitewalk::SitewalkError::config("no credentials").into();
        assert!(err.to_string().contains("no credentials"));
    }
}
