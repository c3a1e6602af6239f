use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::AnalyticsSink;
use crate::config::Config;
use crate::signup::backend::SignupBackend;
use crate::signup::sessions::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable signup backend. Default: SimulatedBackend. Swap via SIGNUP_BACKEND env.
    pub backend: Arc<dyn SignupBackend>,
    /// Conversion event sink. Default: log line. Swap via ANALYTICS_ENDPOINT env.
    pub analytics: Arc<dyn AnalyticsSink>,
    /// Active signup flows, explicitly owned here rather than by a global.
    pub sessions: SessionStore,
}
