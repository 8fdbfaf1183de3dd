//! Configuration module for environment variable parsing.
//!
//! Every setting has a default, so the receiver starts with an empty
//! environment (no secret, listening on port 8080 at `/`).

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Default header carrying the event name.
pub const DEFAULT_EVENT_HEADER: &str = "X-GitHub-Event";

/// Default header carrying the `sha1=<hex>` signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Default request body limit (5 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret for HMAC-SHA1 signature verification
    pub webhook_secret: Option<String>,

    /// Path the webhook route is mounted at
    pub webhook_path: String,

    /// Header carrying the event name
    pub event_header: String,

    /// Header carrying the signature
    pub signature_header: String,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Events the server binary registers a logging handler for
    pub log_events: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            webhook_secret: None,
            webhook_path: "/".to_string(),
            event_header: DEFAULT_EVENT_HEADER.to_string(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_events: vec![
                "ping".to_string(),
                "push".to_string(),
                "pull_request".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            webhook_secret: env::var("WEBHOOK_SECRET").ok(),

            webhook_path: env::var("WEBHOOK_PATH")
                .ok()
                .map(|p| normalize_path(&p))
                .unwrap_or(defaults.webhook_path),

            event_header: non_empty_var("EVENT_HEADER").unwrap_or(defaults.event_header),

            signature_header: non_empty_var("SIGNATURE_HEADER")
                .unwrap_or(defaults.signature_header),

            max_body_bytes: parse_or("MAX_BODY_BYTES", defaults.max_body_bytes),

            log_events: parse_csv("LOG_EVENTS").unwrap_or(defaults.log_events),
        }
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Ensure a route path starts with a single leading slash.
fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    format!("/{}", trimmed)
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
