//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::{
    error::ConfigError,
    state::{interval_config::parse_work_minutes, AppState, IntervalConfig, TimerSnapshot},
};
use super::responses::{
    AlarmResponse, ApiError, DeviceResponse, HealthResponse, LegacyConfigResponse,
    LegacyHealthResponse, LegacySetConfigResponse, SetConfigRequest, StatsQuery, StatsResponse,
};

/// Sessions returned by `GET /stats` when no limit is given
const DEFAULT_STATS_LIMIT: usize = 5;

/// Handle GET /config - Current work and break lengths
pub async fn get_config_handler(State(state): State<Arc<AppState>>) -> Json<IntervalConfig> {
    Json(state.config.current())
}

/// Handle POST /config - Set the work length; the break length follows
pub async fn set_config_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetConfigRequest>, JsonRejection>,
) -> Result<Json<IntervalConfig>, ApiError> {
    apply_config_request(&state, payload).map(Json)
}

fn apply_config_request(
    state: &AppState,
    payload: Result<Json<SetConfigRequest>, JsonRejection>,
) -> Result<IntervalConfig, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected config body: {}", rejection.body_text());
        ConfigError::InvalidDuration(rejection.body_text())
    })?;

    let work_minutes = parse_work_minutes(&request.work_minutes)?;
    match state.set_work_minutes(work_minutes) {
        Ok(config) => {
            info!("Config endpoint called - work time set to {} minutes", config.work_minutes());
            Ok(config)
        }
        Err(e) => {
            warn!("Config update rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Handle GET /api/getWorkTime - Config in the earlier relay's field names
pub async fn legacy_get_config_handler(
    State(state): State<Arc<AppState>>,
) -> Json<LegacyConfigResponse> {
    Json(state.config.current().into())
}

/// Handle POST /api/setWorkTime - Same validation as POST /config
pub async fn legacy_set_config_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetConfigRequest>, JsonRejection>,
) -> Result<Json<LegacySetConfigResponse>, ApiError> {
    let config = apply_config_request(&state, payload)?;
    Ok(Json(config.into()))
}

/// Handle GET /api/health
pub async fn legacy_health_handler(
    State(state): State<Arc<AppState>>,
) -> Json<LegacyHealthResponse> {
    let config = state.config.current();
    Json(LegacyHealthResponse {
        status: "OK".to_string(),
        message: "Pomodoro server is running".to_string(),
        current_work_time: config.work_minutes(),
        current_break_time: config.break_minutes(),
    })
}

/// Handle GET /timer - Current countdown
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Json<TimerSnapshot> {
    Json(state.engine.snapshot())
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<TimerSnapshot> {
    Json(state.start_timer())
}

/// Handle POST /timer/stop
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<TimerSnapshot> {
    Json(state.stop_timer())
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<TimerSnapshot> {
    Json(state.reset_timer())
}

/// Handle POST /alarm/acknowledge - Silence the alarm
pub async fn acknowledge_alarm_handler(State(state): State<Arc<AppState>>) -> Json<AlarmResponse> {
    let acknowledged = state.acknowledge_alarm();
    Json(AlarmResponse {
        acknowledged,
        alarm_active: state.alarm.is_active(),
    })
}

/// Handle GET /stats - Totals and the most recent sessions
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    let recent = state
        .ledger
        .recent_history(query.limit.unwrap_or(DEFAULT_STATS_LIMIT));
    Json(StatsResponse::new(state.ledger.totals(), &recent))
}

/// Handle DELETE /stats - Clear all recorded sessions
pub async fn clear_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    match state.clear_stats() {
        Ok(totals) => Ok(Json(StatsResponse::new(totals, &state.ledger.recent_history(0)))),
        Err(e) => {
            error!("Failed to clear stats: {}", e);
            Err(e.into())
        }
    }
}

/// Handle POST /device/start - Send the current config to the device
pub async fn device_start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeviceResponse>, ApiError> {
    match state.send_start_to_device().await {
        Ok(command) => Ok(Json(DeviceResponse {
            command: command.to_string(),
        })),
        Err(e) => {
            warn!("Device start failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle GET /events - Server-sent stream of timer events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.engine.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Event::default().json_data(&event), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.config.current();
    let (last_action, last_action_time) = state.get_last_action();

    Json(HealthResponse {
        status: "OK".to_string(),
        work_minutes: config.work_minutes(),
        break_minutes: config.break_minutes(),
        uptime: state.get_uptime(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_action,
        last_action_time,
    })
}
