//! Error taxonomy for the user API client.
//!
//! # Design
//! Four classes, and only four: a validation error is detected locally and
//! never reaches the network; a server error carries the HTTP status of a
//! response that did arrive; a connectivity error means no response arrived
//! at all; everything else is unknown. `ErrorKind` exposes the class without
//! the payload so a front-end can pick guidance text per class.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{HttpResponse, TransportError};

/// Message used for every connectivity failure.
pub const CONNECTIVITY_MESSAGE: &str = "unable to reach the server, check your network connection";

/// Fallback for unknown failures that carry no message of their own.
pub const UNKNOWN_MESSAGE: &str = "an unknown error occurred";

/// Errors produced by `UserClient` and surfaced by `UserManager`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Input rejected before any request was built.
    #[error("{0}")]
    Validation(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never reached the server (refused, unreachable, timed out).
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity,

    /// Any other failure, including undecodable response bodies.
    #[error("{0}")]
    Unknown(String),
}

/// The class of an `ApiError`, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Server,
    Connectivity,
    Unknown,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Connectivity => ErrorKind::Connectivity,
            ApiError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            ApiError::Unknown(UNKNOWN_MESSAGE.to_string())
        } else {
            ApiError::Unknown(message)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }

    /// Build a server error from a non-2xx response.
    ///
    /// The payload's `message` field wins when present; otherwise a generic
    /// message keyed on the status code is used.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = payload_message(&response.body)
            .unwrap_or_else(|| generic_status_message(response.status));
        ApiError::Server {
            status: response.status,
            message,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout | TransportError::Connect(_) => ApiError::Connectivity,
            TransportError::Other(msg) => ApiError::unknown(msg),
        }
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

fn payload_message(body: &str) -> Option<String> {
    let payload: ErrorPayload = serde_json::from_str(body).ok()?;
    payload.message.filter(|m| !m.trim().is_empty())
}

fn generic_status_message(status: u16) -> String {
    match status {
        400 => "the submitted data is invalid".to_string(),
        404 => "the requested data was not found".to_string(),
        500 => "the server encountered an internal error".to_string(),
        other => format!("request failed with status {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_prefers_payload_message() {
        let response = HttpResponse::new(404, r#"{"success":false,"message":"User with ID 9 not found"}"#);
        let err = ApiError::from_response(&response);
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                message: "User with ID 9 not found".to_string()
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn server_error_falls_back_to_status_message() {
        let err = ApiError::from_response(&HttpResponse::new(500, "<html>boom</html>"));
        assert_eq!(err.to_string(), "the server encountered an internal error");

        let err = ApiError::from_response(&HttpResponse::new(418, "{}"));
        assert_eq!(err.to_string(), "request failed with status 418");
    }

    #[test]
    fn timeouts_and_refusals_are_connectivity_errors() {
        assert_eq!(ApiError::from(TransportError::Timeout), ApiError::Connectivity);
        let err = ApiError::from(TransportError::Connect("refused".to_string()));
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(err.to_string(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn unknown_error_uses_fallback_when_message_is_empty() {
        let err = ApiError::from(TransportError::Other(String::new()));
        assert_eq!(err, ApiError::Unknown(UNKNOWN_MESSAGE.to_string()));

        let err = ApiError::from(TransportError::Other("tls handshake".to_string()));
        assert_eq!(err.to_string(), "tls handshake");
    }
}
