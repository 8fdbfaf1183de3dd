//! The embedding API: register handlers, then mount the receiver on a router.
//!
//! ```no_run
//! use axum::Router;
//! use hubhook::WebhookServer;
//!
//! let hooks = WebhookServer::new().with_secret("topsecret");
//! hooks.on("push", |payload| println!("push: {}", payload));
//! hooks.on("pull_request", |_| println!("pull_request"));
//!
//! let app: Router = Router::new().route("/github", hooks.handler());
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::HeaderName,
    routing::{any, MethodRouter},
    Router,
};
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::web::handlers::receive_hook;
use crate::web::signature::is_signature_verification_enabled;

/// A webhook receiver instance.
///
/// Holds the shared secret, the header names to read, and the handler
/// registry. Clones share the registry, so handlers registered after the
/// route is mounted still receive events.
#[derive(Clone)]
pub struct WebhookServer {
    secret: Arc<[u8]>,
    event_header: HeaderName,
    signature_header: HeaderName,
    dispatcher: Dispatcher,
}

impl fmt::Debug for WebhookServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookServer")
            .field("secret", &"[redacted]")
            .field("event_header", &self.event_header)
            .field("signature_header", &self.signature_header)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Default for WebhookServer {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookServer {
    /// Create a receiver with no secret and the GitHub header names.
    pub fn new() -> Self {
        Self {
            secret: Arc::from(Vec::new()),
            event_header: HeaderName::from_static("x-github-event"),
            signature_header: HeaderName::from_static("x-hub-signature"),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Build a receiver from environment-derived configuration.
    ///
    /// A whitespace-only secret is treated as unset.
    pub fn from_config(config: &Config) -> Result<Self> {
        let event_header = HeaderName::try_from(config.event_header.as_str())
            .with_context(|| format!("Invalid event header name: {}", config.event_header))?;
        let signature_header = HeaderName::try_from(config.signature_header.as_str())
            .with_context(|| {
                format!("Invalid signature header name: {}", config.signature_header)
            })?;

        let secret = config
            .webhook_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_default();

        let server = Self::new()
            .with_secret(secret)
            .with_event_header(event_header)
            .with_signature_header(signature_header);

        info!(
            event_header = %server.event_header,
            signature_header = %server.signature_header,
            signature_verification = server.verification_enabled(),
            "webhook_server_configured"
        );

        Ok(server)
    }

    /// Set the shared secret. An empty secret disables verification.
    pub fn with_secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Arc::from(secret.as_ref());
        self
    }

    pub fn with_event_header(mut self, name: HeaderName) -> Self {
        self.event_header = name;
        self
    }

    pub fn with_signature_header(mut self, name: HeaderName) -> Self {
        self.signature_header = name;
        self
    }

    /// Register `handler` for deliveries whose event name matches `event`
    /// (ignoring case). Handlers run in registration order.
    pub fn on<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.register(event, handler);
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn event_header(&self) -> &HeaderName {
        &self.event_header
    }

    pub fn signature_header(&self) -> &HeaderName {
        &self.signature_header
    }

    pub fn verification_enabled(&self) -> bool {
        is_signature_verification_enabled(&self.secret)
    }

    /// The per-request entry point, mountable at any path of any router.
    pub fn handler<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        any(receive_hook).with_state(self.clone())
    }

    /// A router serving the receiver at `/`.
    pub fn router(&self) -> Router {
        Router::new().route("/", self.handler())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_EVENT_HEADER, DEFAULT_SIGNATURE_HEADER};

    #[test]
    fn test_new_uses_github_headers() {
        let server = WebhookServer::new();
        assert_eq!(server.event_header().as_str(), DEFAULT_EVENT_HEADER.to_ascii_lowercase());
        assert_eq!(
            server.signature_header().as_str(),
            DEFAULT_SIGNATURE_HEADER.to_ascii_lowercase()
        );
        assert!(!server.verification_enabled());
    }

    #[test]
    fn test_with_secret_enables_verification() {
        let server = WebhookServer::new().with_secret("topsecret");
        assert!(server.verification_enabled());
        assert!(!format!("{:?}", server).contains("topsecret"));
        assert_eq!(server.secret(), b"topsecret");

        let server = server.with_secret("");
        assert!(!server.verification_enabled());
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            webhook_secret: Some("topsecret".to_string()),
            event_header: "X-Gitea-Event".to_string(),
            ..Config::default()
        };

        let server = WebhookServer::from_config(&config).unwrap();

        assert!(server.verification_enabled());
        assert_eq!(server.event_header().as_str(), "x-gitea-event");
        assert_eq!(server.signature_header().as_str(), "x-hub-signature");
    }

    #[test]
    fn test_from_config_blank_secret_disables_verification() {
        let config = Config {
            webhook_secret: Some("   ".to_string()),
            ..Config::default()
        };

        let server = WebhookServer::from_config(&config).unwrap();
        assert!(!server.verification_enabled());
    }

    #[test]
    fn test_from_config_rejects_invalid_header_name() {
        let config = Config {
            event_header: "X Bad Header".to_string(),
            ..Config::default()
        };

        assert!(WebhookServer::from_config(&config).is_err());
    }

    #[test]
    fn test_on_registers_in_shared_registry() {
        let server = WebhookServer::new();
        let mounted = server.clone();

        server.on("push", |_| {});
        server.on("PUSH", |_| {});

        assert_eq!(mounted.dispatcher().handler_count("push"), 2);
    }
}
