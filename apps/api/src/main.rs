mod analytics;
mod calendar;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod signup;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::{AnalyticsSink, HttpSink, TracingSink};
use crate::config::{BackendKind, Config};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::signup::backend::{PostgresBackend, SignupBackend, SimulatedBackend};
use crate::signup::sessions::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting journal signup API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply the schema
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Signup backend (simulated by default; swap via SIGNUP_BACKEND)
    let backend: Arc<dyn SignupBackend> = match config.backend {
        BackendKind::Simulated => Arc::new(SimulatedBackend::new(Duration::from_millis(
            config.simulated_delay_ms,
        ))),
        BackendKind::Postgres => Arc::new(PostgresBackend::new(db.clone())),
    };
    info!("Signup backend initialized ({:?})", config.backend);

    // Conversion event sink (log line by default; swap via ANALYTICS_ENDPOINT)
    let analytics: Arc<dyn AnalyticsSink> = match &config.analytics_endpoint {
        Some(endpoint) => {
            info!("Conversion events will be posted to {endpoint}");
            Arc::new(HttpSink::new(endpoint.clone()))
        }
        None => Arc::new(TracingSink),
    };

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        backend,
        analytics,
        sessions: SessionStore::new(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: tighten CORS in production
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
