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
        .route("/touch/:phase", post(touch_handler))
        .route("/keyboard/show", post(keyboard_show_handler))
        .route("/keyboard/hide", post(keyboard_hide_handler))
        // Control surface
        .route("/activity", post(activity_handler))
        .route("/inactivity-time", post(inactivity_time_handler))
        .route("/is-active", post(is_active_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
