//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    activity::{GestureRequest, KeyboardEvent},
    config::parse_duration_ms,
    state::AppState,
};
use super::responses::{
    ApiResponse, ErrorResponse, HealthResponse, InactivityTimeRequest, IsActiveRequest, StatusResponse,
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal(e: String) -> HandlerError {
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e }))
}

fn bad_request(e: String) -> HandlerError {
    warn!("Rejected request: {}", e);
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e }))
}

fn respond(state: &AppState, message: String) -> Result<Json<ApiResponse>, HandlerError> {
    let region = state.snapshot().map_err(internal)?;
    Ok(Json(ApiResponse::new(message, region)))
}

/// Handle POST /touch/:phase - Report a gesture capture request
pub async fn touch_handler(
    State(state): State<Arc<AppState>>,
    Path(phase): Path<String>,
) -> Result<Json<ApiResponse>, HandlerError> {
    let request = GestureRequest::from_phase(&phase)
        .ok_or_else(|| bad_request(format!("Unknown touch phase: {}", phase)))?;

    let claimed = state.touch(request).map_err(internal)?;
    let Json(response) = respond(&state, format!("Touch {} observed", request))?;
    Ok(Json(response.with_claimed(claimed)))
}

/// Handle POST /keyboard/show - Keyboard became visible
pub async fn keyboard_show_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let listeners = state.keyboard(KeyboardEvent::DidShow);
    info!("Keyboard shown, {} listener(s) notified", listeners);
    respond(&state, "Keyboard shown".to_string())
}

/// Handle POST /keyboard/hide - Keyboard became hidden
pub async fn keyboard_hide_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let listeners = state.keyboard(KeyboardEvent::DidHide);
    info!("Keyboard hidden, {} listener(s) notified", listeners);
    respond(&state, "Keyboard hidden".to_string())
}

/// Handle POST /activity - Reset the timer through the control handle
pub async fn activity_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    state.reset_timer();
    respond(&state, "Inactivity timer reset".to_string())
}

/// Handle POST /inactivity-time - Change the inactivity time
pub async fn inactivity_time_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InactivityTimeRequest>,
) -> Result<Json<ApiResponse>, HandlerError> {
    let duration = parse_duration_ms(body.duration_ms).map_err(|e| bad_request(e.to_string()))?;

    state.change_time_for_inactivity(duration);
    respond(&state, format!("Inactivity time set to {}ms", body.duration_ms))
}

/// Handle POST /is-active - Update the is_active input
pub async fn is_active_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IsActiveRequest>,
) -> Result<Json<ApiResponse>, HandlerError> {
    state.set_is_active(body.active).map_err(internal)?;
    respond(&state, format!("is_active input set to {}", body.active))
}

/// Handle GET /status - Return current region status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, HandlerError> {
    let region = state.snapshot().map_err(internal)?;
    let transitions = state.get_transitions().map_err(internal)?;
    let last_transition = state.get_last_transition().map_err(internal)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        can_expire: region.can_expire(),
        region,
        last_transition,
        transitions,
        keyboard_listeners: state.keyboard.listeners(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
