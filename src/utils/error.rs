use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories shared by every component of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ClientError,
    ServerError,
    NotFound,
    ValidationError,
}

impl ErrorKind {
    /// HTTP status the gateway answers with when this kind reaches a caller.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::ClientError | ErrorKind::ValidationError => 400,
            ErrorKind::ServerError => 500,
        }
    }
}

/// A classified failure of a remote call or of local decoding.
///
/// Built once when the outcome is classified and then carried through retry
/// and propagation without being rewritten.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
    pub source_status: Option<u16>,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, source_status: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_status,
        }
    }

    /// Map a received HTTP status and body to an error kind.
    ///
    /// 404 is `NotFound`, any other 4xx is `ClientError`, 5xx is
    /// `ServerError`. A status outside 400..=599 means the downstream broke
    /// its contract and is treated as a server fault.
    pub fn classify(status: u16, body: &str) -> Self {
        let kind = match status {
            404 => ErrorKind::NotFound,
            400..=499 => ErrorKind::ClientError,
            _ => ErrorKind::ServerError,
        };
        Self::new(kind, body, Some(status))
    }

    /// Local decode or shape failure; never originates from a remote status.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message, None)
    }

    /// Connection refused, reset, or timed out before a response arrived.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message, None)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message, Some(404))
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{message}")]
    ValidationError { message: String },
}

impl GatewayError {
    /// Hint printed next to a startup failure.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GatewayError::ConfigValidationError { .. }
            | GatewayError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags"
            }
            GatewayError::IoError(_) => "Check file paths and that the bind address is free",
            GatewayError::HttpClientError(_) => "Check TLS and proxy settings of the host",
            GatewayError::Remote(_) => "Check that the downstream services are reachable",
            GatewayError::SerializationError(_) | GatewayError::ValidationError { .. } => {
                "Check the request payload"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
