//! Hubhook server - standalone webhook receiver.
//!
//! Mounts the receiver at the configured path and registers a logging
//! handler for each event named in `LOG_EVENTS`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use serde_json::Value;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hubhook::web::health;
use hubhook::{Config, WebhookServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        path = %config.webhook_path,
        max_body_bytes = config.max_body_bytes,
        log_events = ?config.log_events,
        "config_loaded"
    );

    let hooks = WebhookServer::from_config(&config)?;
    for event in &config.log_events {
        let name = event.clone();
        hooks.on(event.as_str(), move |payload: &Value| log_delivery(&name, payload));
    }

    let app = Router::new()
        .route("/health", get(health))
        .route(&config.webhook_path, hooks.handler())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Log a summary of a delivery.
fn log_delivery(event: &str, payload: &Value) {
    let action = payload.get("action").and_then(Value::as_str);
    let repository = payload
        .pointer("/repository/full_name")
        .and_then(Value::as_str);
    let sender = payload.pointer("/sender/login").and_then(Value::as_str);

    info!(
        event = %event,
        action = ?action,
        repository = ?repository,
        sender = ?sender,
        "webhook_event_received"
    );
}

/// Resolve once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "shutdown_signal_received"),
        _ = terminate => info!(signal = "SIGTERM", "shutdown_signal_received"),
    }

    info!("web_server_shutting_down");
}
