//! Error taxonomy shared by every client operation.

use serde_json::{Map, Value};
use std::time::Duration;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured details attached to protocol and server errors.
pub type Details = Map<String, Value>;

pub type Result<T, E = NenDBError> = std::result::Result<T, E>;

/// Coarse category of a [`NenDBError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    Timeout,
    Protocol,
    Server,
}

#[derive(Debug, thiserror::Error)]
pub enum NenDBError {
    /// A parameter or configuration check failed before any request was sent.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The server could not be reached, or the connection broke mid-exchange.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: BoxError,
    },

    /// A single attempt exceeded its deadline.
    #[error("Timeout error: {message} (after {timeout:?})")]
    Timeout {
        message: String,
        timeout: Duration,
        #[source]
        source: BoxError,
    },

    /// The server answered with a body we could not interpret.
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        details: Option<Details>,
    },

    /// The server reported a failure.
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        status: u16,
        message: String,
        details: Option<Details>,
    },
}

impl NenDBError {
    pub fn validation(message: impl Into<String>) -> Self {
        NenDBError::Validation {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        NenDBError::Connection {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn timeout(
        message: impl Into<String>,
        timeout: Duration,
        source: impl Into<BoxError>,
    ) -> Self {
        NenDBError::Timeout {
            message: message.into(),
            timeout,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NenDBError::Validation { .. } => ErrorKind::Validation,
            NenDBError::Connection { .. } => ErrorKind::Connection,
            NenDBError::Timeout { .. } => ErrorKind::Timeout,
            NenDBError::Protocol { .. } => ErrorKind::Protocol,
            NenDBError::Server { .. } => ErrorKind::Server,
        }
    }

    /// The human-readable message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            NenDBError::Validation { message }
            | NenDBError::Connection { message, .. }
            | NenDBError::Timeout { message, .. }
            | NenDBError::Protocol { message, .. }
            | NenDBError::Server { message, .. } => message,
        }
    }

    pub fn details(&self) -> Option<&Details> {
        match self {
            NenDBError::Protocol { details, .. } | NenDBError::Server { details, .. } => {
                details.as_ref()
            }
            _ => None,
        }
    }

    /// HTTP status of a server-reported failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            NenDBError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport failures, timeouts and 5xx responses may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            NenDBError::Connection { .. } | NenDBError::Timeout { .. } => true,
            NenDBError::Server { status, .. } => *status >= 500,
            NenDBError::Validation { .. } | NenDBError::Protocol { .. } => false,
        }
    }
}
