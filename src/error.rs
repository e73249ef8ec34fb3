/// Error taxonomy for the diagram core, the persistence boundary and storage
///
/// Local validation failures (`DiagramError`) refuse the mutation outright.
/// Remote failures (`RemoteError`) never block a local mutation; they are
/// handed to an `ErrorSink` instead.

use crate::process::types::{ConnectionId, ElementId};
use thiserror::Error;

/// Errors raised by the in-memory diagram model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    #[error("Element label must not be empty")]
    EmptyLabel,

    #[error("Element '{0}' not found in the open process")]
    ElementNotFound(ElementId),

    #[error("Connection '{0}' not found in the open process")]
    ConnectionNotFound(ConnectionId),

    #[error("Element '{0}' cannot be connected to itself")]
    SelfConnection(ElementId),
}

impl DiagramError {
    /// Whether this is a validation failure (as opposed to a missing id)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyLabel | Self::SelfConnection(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_) | Self::ConnectionNotFound(_))
    }
}

/// Failure of a call across the persistence boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("request failed"))]
    Status {
        status: u16,
        /// The `error` field of the response body, when the server sent one
        message: Option<String>,
    },

    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Classification of a `RemoteError` by HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Unprocessable,
    ServerError,
    OtherStatus(u16),
    Unreachable,
    Client,
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Status { status, .. } => match status {
                400 => RemoteErrorKind::BadRequest,
                401 => RemoteErrorKind::Unauthorized,
                403 => RemoteErrorKind::Forbidden,
                404 => RemoteErrorKind::NotFound,
                409 => RemoteErrorKind::Conflict,
                422 => RemoteErrorKind::Unprocessable,
                500 => RemoteErrorKind::ServerError,
                other => RemoteErrorKind::OtherStatus(*other),
            },
            Self::Unreachable(_) => RemoteErrorKind::Unreachable,
            Self::Decode(_) => RemoteErrorKind::Client,
        }
    }

    /// HTTP status of the failed call, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    ///
    /// Statuses where the server explains itself (400, 409, 422, unknown
    /// codes) prefer the server text.
    pub fn user_message(&self) -> String {
        let server_text = match self {
            Self::Status { message, .. } => message.clone(),
            _ => None,
        };

        match self.kind() {
            RemoteErrorKind::BadRequest => server_text.unwrap_or_else(|| "Invalid request".to_string()),
            RemoteErrorKind::Unauthorized => {
                "Your session has expired. Please sign in again.".to_string()
            }
            RemoteErrorKind::Forbidden => "You do not have permission for this action".to_string(),
            RemoteErrorKind::NotFound => "The requested resource was not found".to_string(),
            RemoteErrorKind::Conflict => server_text.unwrap_or_else(|| "A conflict occurred".to_string()),
            RemoteErrorKind::Unprocessable => server_text.unwrap_or_else(|| "Invalid data".to_string()),
            RemoteErrorKind::ServerError => "Server error. Please try again later.".to_string(),
            RemoteErrorKind::OtherStatus(status) => {
                server_text.unwrap_or_else(|| format!("HTTP {} error", status))
            }
            RemoteErrorKind::Unreachable => {
                "Cannot reach the server. Check your internet connection.".to_string()
            }
            RemoteErrorKind::Client => self.to_string(),
        }
    }
}

/// Rejections raised by the storage layer
///
/// Carried inside `anyhow::Error`; the API layer downcasts to pick the
/// response status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: Option<&str>) -> RemoteError {
        RemoteError::Status {
            status: code,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn classifies_known_statuses() {
        assert_eq!(status(400, None).kind(), RemoteErrorKind::BadRequest);
        assert_eq!(status(401, None).kind(), RemoteErrorKind::Unauthorized);
        assert_eq!(status(403, None).kind(), RemoteErrorKind::Forbidden);
        assert_eq!(status(404, None).kind(), RemoteErrorKind::NotFound);
        assert_eq!(status(409, None).kind(), RemoteErrorKind::Conflict);
        assert_eq!(status(422, None).kind(), RemoteErrorKind::Unprocessable);
        assert_eq!(status(500, None).kind(), RemoteErrorKind::ServerError);
        assert_eq!(status(502, None).kind(), RemoteErrorKind::OtherStatus(502));
        assert_eq!(
            RemoteError::Unreachable("refused".into()).kind(),
            RemoteErrorKind::Unreachable
        );
    }

    #[test]
    fn server_text_wins_where_the_server_explains_itself() {
        assert_eq!(status(409, Some("already linked")).user_message(), "already linked");
        assert_eq!(status(409, None).user_message(), "A conflict occurred");
        // 403 ignores the body on purpose
        assert_eq!(
            status(403, Some("nope")).user_message(),
            "You do not have permission for this action"
        );
        assert_eq!(status(418, None).user_message(), "HTTP 418 error");
    }
}
