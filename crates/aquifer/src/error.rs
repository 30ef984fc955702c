//! Error types for aquifer
//!
//! The pool distinguishes locally-recovered failures (dead connections on
//! handout, failed session scrubs) from user-visible ones: only inline
//! connection setup in async mode and post-termination requests surface an
//! error to the caller.

use thiserror::Error;

/// Result type for aquifer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for aquifer
#[derive(Error, Debug)]
pub enum Error {
    /// Connection setup failed
    #[error("connection setup failed: {message}")]
    Connect {
        /// Human-readable failure description
        message: String,
        /// Underlying driver error, when available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Session scrub failed; the connection is not safe to reuse
    #[error("session scrub failed: {message}")]
    Scrub {
        /// Human-readable failure description
        message: String,
    },

    /// Invalid pool configuration
    #[error("configuration error: {message}")]
    Configuration {
        /// What was rejected and why
        message: String,
    },

    /// The pool has been disposed; no further handouts
    #[error("pool is terminated")]
    Terminated,

    /// Internal error (worker death, thread spawn failure)
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable failure description
        message: String,
    },
}

impl Error {
    /// Create a connection setup error
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection setup error with an underlying driver error
    pub fn connect_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connect {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a session scrub error
    pub fn scrub(message: impl Into<String>) -> Self {
        Self::Scrub {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation can reasonably succeed.
    ///
    /// Connection setup races against transient database conditions and is
    /// worth retrying; the remaining variants are terminal for their request.
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connect("connection refused");
        assert!(err.to_string().contains("connection refused"));

        let err = Error::config("initial_size must be at least 1");
        assert!(err.to_string().contains("initial_size"));

        assert_eq!(Error::Terminated.to_string(), "pool is terminated");
    }

    #[test]
    fn test_error_is_retriable() {
        assert!(Error::connect("refused").is_retriable());

        assert!(!Error::Terminated.is_retriable());
        assert!(!Error::scrub("temp tables left behind").is_retriable());
        assert!(!Error::config("bad size").is_retriable());
        assert!(!Error::internal("worker died").is_retriable());
    }

    #[test]
    fn test_connect_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::connect_with_source("tcp connect failed", io);

        assert!(std::error::Error::source(&err).is_some());
    }
}
