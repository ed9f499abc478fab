//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/config", get(get_config_handler).post(set_config_handler))
        .route("/health", get(health_handler))
        .route("/timer", get(timer_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/stop", post(stop_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/alarm/acknowledge", post(acknowledge_alarm_handler))
        .route("/stats", get(stats_handler).delete(clear_stats_handler))
        .route("/device/start", post(device_start_handler))
        .route("/events", get(events_handler))
        // Endpoints of the earlier relay server, still used by deployed devices
        .route("/api/setWorkTime", post(legacy_set_config_handler))
        .route("/api/getWorkTime", get(legacy_get_config_handler))
        .route("/api/health", get(legacy_health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
