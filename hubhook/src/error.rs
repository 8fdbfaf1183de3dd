//! Request rejection taxonomy for the webhook endpoint.
//!
//! Every rejection maps to a status code and a short plain-text body.
//! Processing stops at the first error; nothing is dispatched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias using `WebhookError`.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Reasons a webhook delivery is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The event-name header is absent, empty, or not valid UTF-8.
    #[error("Bad Request: missing event header")]
    MissingEvent,

    #[error("Bad Request: empty body")]
    MissingBody,

    #[error("Bad Request: unreadable body")]
    BodyRead(String),

    /// Signature header absent or not matching the body.
    #[error("Bad Request: invalid signature")]
    InvalidSignature,

    /// Content type is neither JSON nor form-encoded.
    #[error("Bad Request: unsupported content type")]
    UnsupportedContentType(Option<String>),

    /// Form body could not be parsed.
    #[error("Bad Request: malformed form body")]
    MalformedForm(String),

    /// Form body has no `payload` field.
    #[error("Bad Request: missing payload field")]
    MissingPayloadField,

    #[error("Bad Request: invalid JSON payload")]
    InvalidJson(#[from] serde_json::Error),

    /// Body held no JSON value at all.
    #[error("Bad Request: empty JSON payload")]
    EmptyPayload,
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short machine-friendly label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MissingEvent => "missing_event",
            Self::MissingBody => "missing_body",
            Self::BodyRead(_) => "body_read",
            Self::InvalidSignature => "invalid_signature",
            Self::UnsupportedContentType(_) => "unsupported_content_type",
            Self::MalformedForm(_) => "malformed_form",
            Self::MissingPayloadField => "missing_payload_field",
            Self::InvalidJson(_) => "invalid_json",
            Self::EmptyPayload => "empty_payload",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
