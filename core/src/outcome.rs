//! The uniform `{success, data, message}` result shape.

use serde::Serialize;

use crate::error::{ApiError, ErrorKind};

/// Outcome of one controller action, ready to render.
///
/// `kind` is set on failure so a front-end can choose guidance per error
/// class; it is omitted from JSON on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            kind: None,
        }
    }

    pub fn failed(err: &ApiError) -> Self {
        Self {
            success: false,
            data: None,
            message: err.to_string(),
            kind: Some(err.kind()),
        }
    }

    pub fn from_result(result: Result<T, ApiError>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(data, message),
            Err(err) => Self::failed(&err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        ApiResult {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
            kind: self.kind,
        }
    }
}
