//! Runtime error types

use serde_json::Value;
use thiserror::Error;

/// A failed exchange with the runtime backend
///
/// `status` is the HTTP status of the response, or `0` when no exchange
/// happened at all (connection refused, DNS failure, timeout).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (status {status})")]
pub struct TransportError {
    /// Human-readable description, usually including the response body
    pub message: String,

    /// HTTP status code, `0` when the backend was never reached
    pub status: u16,

    /// Structured payload from the response body, if any
    pub details: Option<Value>,
}

impl TransportError {
    /// Create a transport error for a response that came back with a non-2xx status
    pub fn rejected(message: impl Into<String>, status: u16, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status,
            details,
        }
    }

    /// Create a transport error for a request that never got a response
    pub fn unreachable(message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status: 0,
            details,
        }
    }

    /// True when the backend could not be reached (status 0)
    ///
    /// Retrying later may help; the request itself was never judged.
    pub fn is_unreachable(&self) -> bool {
        self.status == 0
    }

    /// True when the backend answered and refused the request (status >= 400)
    pub fn is_rejected(&self) -> bool {
        self.status >= 400
    }
}

/// Errors that can occur in the runtime client
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A request to the backend failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The local runtime process could not be brought up
    #[error("Failed to start local runtime: {0}")]
    Startup(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A successful response had a body we could not decode
    #[error("Failed to decode {route} response: {source}")]
    Decode {
        /// Route the body came from
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Create a startup error
    pub fn startup(msg: impl Into<String>) -> Self {
        RuntimeError::Startup(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        RuntimeError::InvalidConfig(msg.into())
    }

    /// The transport error, if this is one
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            RuntimeError::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of the underlying exchange, if this error came from one
    pub fn status(&self) -> Option<u16> {
        self.as_transport().map(|e| e.status)
    }
}

/// Result type alias for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::startup("health check never passed");
        assert_eq!(
            err.to_string(),
            "Failed to start local runtime: health check never passed"
        );

        let err: RuntimeError =
            TransportError::rejected("Chat request failed: nope", 422, None).into();
        assert_eq!(err.to_string(), "Chat request failed: nope (status 422)");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "node not found");
        let runtime_err: RuntimeError = io_err.into();
        assert!(matches!(runtime_err, RuntimeError::Io(_)));
        assert_eq!(runtime_err.status(), None);
    }

    #[test]
    fn test_unreachable_vs_rejected() {
        let down = TransportError::unreachable("connection refused", None);
        assert!(down.is_unreachable());
        assert!(!down.is_rejected());

        let refused = TransportError::rejected("bad", 503, Some(json!({"error": "busy"})));
        assert!(!refused.is_unreachable());
        assert!(refused.is_rejected());

        let err: RuntimeError = refused.into();
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.as_transport().and_then(|t| t.details.clone()),
            Some(json!({"error": "busy"}))
        );
    }
}
