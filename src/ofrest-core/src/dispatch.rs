//! Response classification
//!
//! Turns the status code and raw body of one HTTP response into either a
//! [`Reply`] or an [`ApiError`]. The transport lives in `ofrest-rs`; this
//! module has no I/O so every branch can be exercised directly.

use serde_json::Value;

use crate::error::{ApiError, ErrorKind};

const DEFAULT_ERROR_MESSAGE: &str = "Unknown error";

/// Successful outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The body decoded as JSON.
    Json(Value),
    /// The server accepted the request but sent nothing decodable.
    Empty,
}

impl Reply {
    /// Collapse into a JSON value; an empty reply becomes `true`.
    pub fn into_value(self) -> Value {
        match self {
            Reply::Json(value) => value,
            Reply::Empty => Value::Bool(true),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}

/// Classify a response by status code and body.
///
/// Only 200 and 201 count as success. Every other status is read as an
/// error body of the form `{"exception": "...", "message": "..."}`.
pub fn classify(status: u16, body: &[u8]) -> Result<Reply, ApiError> {
    if matches!(status, 200 | 201) {
        return Ok(match serde_json::from_slice::<Value>(body) {
            Ok(value) => Reply::Json(value),
            Err(_) => Reply::Empty,
        });
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidStatus { status })?;

    let tag = value.get("exception").and_then(Value::as_str);
    let message = match value.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => DEFAULT_ERROR_MESSAGE.to_string(),
        Some(other) => other.to_string(),
    };

    match tag.and_then(ErrorKind::from_tag) {
        Some(kind) => Err(ApiError::Server { kind, message }),
        None => Err(ApiError::UnknownException {
            status,
            tag: tag.map(str::to_string),
        }),
    }
}
