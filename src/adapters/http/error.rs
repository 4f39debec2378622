//! Mapping of gateway failures onto HTTP responses.

use crate::utils::error::{GatewayError, RemoteError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Error returned by every handler.
///
/// The body is the error message as plain text so callers can tell
/// "no such movie" from "reviews backend down".
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        let status = StatusCode::from_u16(err.kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.message)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ValidationError { message } => Self::new(StatusCode::BAD_REQUEST, message),
            GatewayError::Remote(remote) => remote.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), message = %self.message, "Request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), message = %self.message, "Request rejected");
        }
        (self.status, self.message).into_response()
    }
}
