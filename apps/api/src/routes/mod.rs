pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::signup::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Signup flow API
        .route("/api/v1/signup", post(handlers::handle_start))
        .route("/api/v1/signup/validate", post(handlers::handle_validate))
        .route("/api/v1/signup/:id", get(handlers::handle_status))
        .route("/api/v1/signup/:id/account", post(handlers::handle_account))
        .route("/api/v1/signup/:id/profile", post(handlers::handle_profile))
        .route("/api/v1/signup/:id/skip", post(handlers::handle_skip))
        .route(
            "/api/v1/signup/:id/calendar-link",
            get(handlers::handle_calendar_link),
        )
        .with_state(state)
}
