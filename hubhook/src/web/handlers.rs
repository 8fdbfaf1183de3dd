//! Webhook endpoint handler.
//!
//! Each delivery goes through the same fixed sequence, stopping at the first
//! failure:
//! 1. Reject `GET`
//! 2. Read the event name header
//! 3. Read the body
//! 4. Verify the signature (if a secret is configured)
//! 5. Decode the payload according to `Content-Type`
//! 6. Dispatch to the registered handlers
//!
//! Success is an empty `200 OK`.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::DispatchReport;
use crate::error::{Result, WebhookError};
use crate::web::payload::decode_payload;
use crate::web::server::WebhookServer;
use crate::web::signature::is_valid_signature;

// =============================================================================
// Health Check
// =============================================================================

/// Body of the health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness endpoint for the standalone binary.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Webhook Delivery
// =============================================================================

/// A delivery that passed validation and was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub event: String,
    pub report: DispatchReport,
}

/// Webhook endpoint, mounted via [`WebhookServer::handler`].
pub async fn receive_hook(
    State(server): State<WebhookServer>,
    method: Method,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    match process_delivery(&server, &method, &headers, body) {
        Ok(delivery) => {
            info!(
                event = %delivery.event,
                handlers = delivery.report.matched,
                failed_handlers = delivery.report.failed,
                "webhook_dispatched"
            );
            StatusCode::OK.into_response()
        }
        Err(e) => {
            warn!(
                method = %method,
                reason = e.kind(),
                error = %e,
                "webhook_rejected"
            );
            e.into_response()
        }
    }
}

/// Validate, decode and dispatch one delivery.
pub fn process_delivery(
    server: &WebhookServer,
    method: &Method,
    headers: &HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Delivery> {
    if *method == Method::GET {
        return Err(WebhookError::MethodNotAllowed);
    }

    // to_str() only accepts visible ASCII; event names may be any UTF-8.
    let event = headers
        .get(server.event_header())
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .filter(|v| !v.is_empty())
        .ok_or(WebhookError::MissingEvent)?;

    let body = body.map_err(|e| WebhookError::BodyRead(e.body_text()))?;
    if body.is_empty() {
        return Err(WebhookError::MissingBody);
    }

    if server.verification_enabled() {
        let signature = headers
            .get(server.signature_header())
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !is_valid_signature(&body, signature, server.secret()) {
            return Err(WebhookError::InvalidSignature);
        }
    }

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let payload = decode_payload(content_type, &body)?;

    let report = server.dispatcher().dispatch(event, &payload);

    Ok(Delivery {
        event: event.to_string(),
        report,
    })
}
