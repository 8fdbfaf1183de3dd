//! Hubhook - GitHub-style webhook receiver.
//!
//! Accepts webhook deliveries over HTTP, verifies the `X-Hub-Signature`
//! HMAC-SHA1 signature when a secret is configured, decodes the JSON payload
//! (raw or form-encoded) and fans it out to the handlers registered for the
//! delivery's event name.
//!
//! ## Flow
//!
//! ```text
//! POST → method/event/body checks → signature → decode → Dispatcher → handlers
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{DispatchReport, Dispatcher, HandlerBinding};
pub use error::WebhookError;
pub use web::WebhookServer;
