//! HTTP server entry point and Axum router setup.
//!
//! Loads settings, builds the agent once, and serves `POST /api/ask` until
//! ctrl-c.

mod dto;
mod error;
mod handlers;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use askdoc_config::Settings;
use askdoc_engine::{Agent, FunctionAgent};
use askdoc_llm::{discover_models, model_available};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared server state accessible from all handlers.
pub struct ServerState {
    pub agent: Arc<dyn Agent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let settings = Settings::from_env().context("failed to load settings")?;
    let state = Arc::new(init_server_state(&settings).await?);
    let app = build_router(state);

    info!("Starting server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Builds the agent and checks that the configured model is pulled.
async fn init_server_state(settings: &Settings) -> Result<ServerState> {
    let agent = FunctionAgent::from_settings(settings).context("failed to build agent")?;

    info!(
        "Agent '{}' using {} at {} (timeout {:?}, context window {})",
        agent.profile().name,
        settings.model.model,
        agent.llm().api_base(),
        settings.model.request_timeout,
        settings.model.context_window
    );
    info!("Registered tools: {:?}", agent.tool_names());

    match discover_models(&settings.model.api_base).await {
        Ok(models) if model_available(&models, &settings.model.model) => {
            info!("Model {} is available", settings.model.model);
        }
        Ok(models) => {
            warn!("Model {} not found in Ollama (have: {:?})", settings.model.model, models);
        }
        Err(e) => {
            warn!("Ollama discovery failed (is Ollama running?): {}", e);
        }
    }

    Ok(ServerState { agent: Arc::new(agent) })
}

/// Builds the router: the traced API routes, health check, fallback, and CORS.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // Mirroring keeps "any origin" valid together with credentials.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/api/ask", post(handlers::ask::ask))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(state)
}

/// Wait for ctrl-c signal for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to install ctrl-c handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
