//! HTTP server: shared state, router assembly and process lifecycle.

use anyhow::{anyhow, Result};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

use crate::{
    error::{ApiError, Rejection},
    headers::HeaderUtil,
    middleware::{
        create_body_limit_layer, create_cors_layer, create_rate_limiter,
        error_logging_middleware, rate_limit_middleware, security_headers_middleware,
        AppRateLimiter,
    },
    repository::{self, Database},
    settings::Settings,
    tutor_resource,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub headers: HeaderUtil,
    pub rate_limiter: Arc<AppRateLimiter>,
    pub settings: Arc<Settings>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings, db: Arc<dyn Database>) -> Self {
        Self {
            db,
            headers: HeaderUtil::new(&settings.application.name),
            rate_limiter: create_rate_limiter(&settings.security),
            settings: Arc::new(settings),
            started_at: Instant::now(),
        }
    }

    /// Attach the client alert headers to a failed request.
    pub fn reject(&self, error: ApiError) -> Rejection {
        Rejection::new(error, &self.headers)
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    database: &'static str,
}

/// Create the HTTP router with all endpoints and middleware
pub fn create_router(state: AppState) -> Router {
    let security = &state.settings.security;

    let mut app = Router::new()
        .route("/health", get(health_check))
        .nest("/api", tutor_resource::routes())
        .with_state(state.clone());

    if security.enable_rate_limiting {
        app = app.layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));
    }
    if security.enable_security_headers {
        app = app.layer(middleware::from_fn(security_headers_middleware));
    }

    // Outermost first: tracing sees every request, including rejected ones.
    app.layer(middleware::from_fn(error_logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_body_limit_layer(security.max_request_size_mb))
                .layer(create_cors_layer(security))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    state.settings.server.request_timeout_seconds,
                ))),
        )
}

/// Health check endpoint
#[instrument(skip(state))]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match state.db.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "up"),
        Err(e) => {
            error!("Health check failed: {}", e);
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database,
    };

    (code, Json(response))
}

/// Open the configured database, creating the schema when needed.
pub async fn open_database(settings: &Settings) -> Result<Arc<dyn Database>> {
    repository::connect(&settings.database)
        .await
        .map_err(|e| anyhow!("Failed to open {:?} database: {}", settings.database.backend, e))
}

/// Start the HTTP server and wait for shutdown signal
pub async fn serve(settings: Settings, addr: Option<SocketAddr>) -> Result<()> {
    let addr: SocketAddr = match addr {
        Some(addr) => addr,
        None => settings
            .bind_address()
            .parse()
            .map_err(|e| anyhow!("Invalid server address: {}", e))?,
    };

    let db = open_database(&settings).await?;
    let app = create_router(AppState::new(settings, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
