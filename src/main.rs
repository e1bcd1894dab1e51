//! Magic Prompt - prompt up-leveling client
//!
//! Sends a draft prompt to a remote service for improvement, keeps the
//! original and improved prompt together as a conversation, and carries a
//! follow-up chat anchored to it. The interaction controller is exposed to
//! the presentation layer over HTTP.

mod api;
mod config;
mod controller;
mod gateway;
mod runtime;
mod session;

use api::{create_router, AppState};
use config::Config;
use gateway::{HttpTransport, LoggingTransport, RequestGateway};
use runtime::Controller;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magic_prompt=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;
    tracing::info!(
        service_url = %config.service_url,
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        "Configured up-level service"
    );

    // Gateway and controller
    let transport = HttpTransport::new(&config.service_url, config.request_timeout)?;
    let gateway = Arc::new(RequestGateway::new(LoggingTransport::new(transport)));
    let controller = Controller::spawn(gateway);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(controller))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Magic Prompt server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
