// Failure kinds surfaced by the engine. Every fetch failure ends up as a
// terminal task state carrying one of these; nothing is silently swallowed.

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while resolving, transferring, or caching a resource.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Bad or missing descriptor: unreadable local file, unknown asset or
    /// resource id, no provider configured.
    #[error("resolution failed: {message}")]
    Resolution { message: String },

    /// Network failure, non-success HTTP status, or truncated read.
    #[error("transfer failed: {message}")]
    Transfer { message: String },

    /// Disk cache write failure: temp write or atomic publish.
    #[error("cache write failed: {message}")]
    CacheWrite {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An operation was invoked from an unsuitable execution context, e.g.
    /// a blocking wait from inside the async runtime.
    #[error("consumer misuse: {message}")]
    ConsumerMisuse { message: String },
}

impl LoadError {
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    pub fn cache_write(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::CacheWrite {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn consumer_misuse(message: impl Into<String>) -> Self {
        Self::ConsumerMisuse {
            message: message.into(),
        }
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }

    pub fn is_cache_write(&self) -> bool {
        matches!(self, Self::CacheWrite { .. })
    }

    pub fn is_consumer_misuse(&self) -> bool {
        matches!(self, Self::ConsumerMisuse { .. })
    }
}

/// Failures are shared between every listener and caller of a task.
pub type SharedError = Arc<LoadError>;
