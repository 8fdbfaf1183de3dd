//! Web module for receiving webhook deliveries.
//!
//! This module provides:
//! - `WebhookServer`: the embedding API (register handlers, mount the route)
//! - The per-request handler that validates, decodes and dispatches
//! - HMAC-SHA1 signature verification
//! - Content-type aware payload decoding

pub mod handlers;
pub mod payload;
pub mod server;
pub mod signature;

pub use handlers::{health, process_delivery, receive_hook, Delivery, HealthResponse};
pub use payload::{decode_payload, PayloadFormat};
pub use server::WebhookServer;
pub use signature::{is_signature_verification_enabled, is_valid_signature, sign};
