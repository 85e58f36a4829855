mod config;
mod error;
mod handlers;
mod producer;
mod recipients;
mod services;
mod state;
mod stores;
#[cfg(test)]
mod test_utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, extract::DefaultBodyLimit, http};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    producer::TracingObserver,
    recipients::{AdminKey, RecipientRegistry},
    services::JsonRpcRoleDiscovery,
    state::AppState,
    stores::Stores,
};

#[derive(Parser)]
#[command(name = "evidence-api")]
#[command(about = "Evidence encryption and storage endpoint")]
struct Args {
    /// Load configuration and key material, report, and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();
    let config = envy::prefixed("EVIDENCE_").from_env::<Config>()?;

    // Initialize Sentry for error tracking (must be done early, guard must stay alive)
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let registry = RecipientRegistry::from_config(&config)?;
    let admin = AdminKey::from_config(&config)?;

    match &admin {
        Some(admin) => tracing::info!(address = %admin.address, "admin key loaded"),
        None if config.allow_plaintext_storage => {
            tracing::warn!("no admin key configured; evidence without recipients is stored unencrypted")
        }
        None => tracing::warn!("no admin key configured; submissions will be refused"),
    }
    tracing::info!(known_recipients = registry.len(), "recipient registry loaded");

    if args.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    let stores = Stores::from_config(&config);
    let discovery = JsonRpcRoleDiscovery::new(&config.rpc_url, config.rpc_timeout());

    let state = AppState {
        config: config.clone(),
        stores,
        discovery: Arc::new(discovery),
        registry: Arc::new(registry),
        admin,
        observer: Arc::new(TracingObserver),
    };

    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(storage_dir = %config.storage_dir, "Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

fn app(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(handlers::health::router())
        .merge(handlers::evidence::router())
        .with_state(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        // The configured limit replaces axum's 2 MB extractor default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
