//! Error handling for username probing operations.
//!
//! This module defines a comprehensive error type that covers all the different
//! ways a probing run can fail, from network issues to invalid input.

use std::fmt;

/// Main error type for username probing operations.
///
/// This enum covers all possible failure modes in the probing process,
/// providing detailed context for debugging and user-friendly error messages.
///
/// Transport failures during a probe are deliberately NOT represented here:
/// they are carried in-band as `Verdict::Indeterminate` on the probe result,
/// so callers branch on the verdict rather than catching errors.
#[derive(Debug, Clone)]
pub enum HandleCheckError {
    /// Invalid username format
    InvalidUsername { username: String, reason: String },

    /// Network-related errors (connection, timeout, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// HTTP-level errors outside the classification path
    HttpError {
        username: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors for checkpoint, result log, or debug dumps.
    /// These break the resumability contract and are fatal.
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl HandleCheckError {
    /// Create a new invalid username error.
    pub fn invalid_username<U: Into<String>, R: Into<String>>(username: U, reason: R) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP error with status code.
    pub fn http_with_status<U: Into<String>, M: Into<String>>(
        username: U,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::HttpError {
            username: username.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is fatal to a bulk run.
    ///
    /// File errors break the resumability contract and must abort the run;
    /// everything else is either recovered locally or reported per-probe.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FileError { .. } | Self::ConfigError { .. })
    }
}

impl fmt::Display for HandleCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername { username, reason } => {
                write!(f, "Invalid username '{}': {}", username, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::HttpError {
                username,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error for '{}' ({}): {}", username, code, message)
                } else {
                    write!(f, "HTTP error for '{}': {}", username, message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for HandleCheckError {}

// Implement From conversions for common error types
impl From<reqwest::Error> for HandleCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", std::time::Duration::from_secs(10))
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for HandleCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for HandleCheckError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_username() {
        let err = HandleCheckError::invalid_username("bad name", "contains whitespace");
        assert_eq!(
            err.to_string(),
            "Invalid username 'bad name': contains whitespace"
        );
    }

    #[test]
    fn test_display_file_error() {
        let err = HandleCheckError::file_error("checked.txt", "permission denied");
        assert!(err.to_string().contains("checked.txt"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(HandleCheckError::file_error("x", "y").is_fatal());
        assert!(HandleCheckError::config("bad quota").is_fatal());
        assert!(!HandleCheckError::network("reset").is_fatal());
        assert!(!HandleCheckError::invalid_username("a", "b").is_fatal());
    }
}
