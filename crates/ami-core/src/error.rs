//! Error types for the AMI client

use std::time::Duration;

use thiserror::Error;

/// Result type for AMI client operations
pub type Result<T> = std::result::Result<T, AmiError>;

/// Errors that can occur while querying the manager interface
///
/// Transport-level failures and explicit server errors abort the query.
/// Structural oddities in the server's responses (unknown fields, foreign
/// action ids, malformed contact URIs) are never reported here; they are
/// skipped by the parser and classifier.
#[derive(Debug, Error)]
pub enum AmiError {
    /// TCP connect failed
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Read or write on an established connection failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connect timeout or session deadline exceeded
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: &'static str,
        duration: Duration,
    },

    /// The peer closed the connection before a required message arrived
    #[error("Connection closed by peer while waiting for {stage}")]
    UnexpectedEof { stage: &'static str },

    /// The peer sent more than `limit` bytes without a frame delimiter
    #[error("Frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge { size: usize, limit: usize },

    /// The server answered our action with `Response: Error`
    #[error("Error: {message}")]
    Protocol { message: String },

    /// Configuration rejected before connecting
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A blocking query was made from within an async runtime
    #[error("Blocking query called from inside an async runtime; use the async API")]
    BlockingInAsync,
}

impl AmiError {
    /// Create a protocol error carrying the server's message
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: &'static str, duration: Duration) -> Self {
        Self::Timeout {
            operation,
            duration,
        }
    }

    /// Whether this error came from the transport rather than the server
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Io(_)
                | Self::Timeout { .. }
                | Self::UnexpectedEof { .. }
                | Self::FrameTooLarge { .. }
        )
    }
}
