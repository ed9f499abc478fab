//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{ConfigError, LinkError, PersistenceError},
    state::{IntervalConfig, LedgerTotals, RecentHistory, SessionRecord},
};

/// Body of `POST /config`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetConfigRequest {
    /// Kept loose so that fractional or non-numeric values get a validation
    /// error instead of a deserialization failure
    #[serde(default, alias = "workTime")]
    pub work_minutes: Value,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub uptime: String,
    pub version: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Config as reported by the earlier relay's `/api/getWorkTime`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConfigResponse {
    pub work_time: u32,
    pub break_time: u32,
}

impl From<IntervalConfig> for LegacyConfigResponse {
    fn from(config: IntervalConfig) -> Self {
        Self {
            work_time: config.work_minutes(),
            break_time: config.break_minutes(),
        }
    }
}

/// Reply to `/api/setWorkTime`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySetConfigResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub config: LegacyConfigResponse,
}

impl From<IntervalConfig> for LegacySetConfigResponse {
    fn from(config: IntervalConfig) -> Self {
        Self {
            success: true,
            message: format!(
                "Work time updated to {} minutes, break time to {} minutes",
                config.work_minutes(),
                config.break_minutes()
            ),
            config: config.into(),
        }
    }
}

/// Reply to `/api/health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHealthResponse {
    pub status: String,
    pub message: String,
    pub current_work_time: u32,
    pub current_break_time: u32,
}

/// Completed-session statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub pomodoros_completed: u64,
    pub focus_minutes: u64,
    /// Most recent first
    pub sessions: Vec<SessionRecord>,
}

impl StatsResponse {
    pub fn new(totals: LedgerTotals, recent: &RecentHistory) -> Self {
        Self {
            pomodoros_completed: totals.pomodoros_completed,
            focus_minutes: totals.focus_minutes,
            sessions: recent.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmResponse {
    pub acknowledged: bool,
    pub alarm_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceResponse {
    pub command: String,
}

/// Failures reported to HTTP clients.
///
/// "Value rejected" (400) and "could not save" (500) are kept apart so a client
/// can tell whether to change its input or retry.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("value rejected: {0}")]
    Rejected(#[from] ConfigError),

    #[error("could not save: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("device link error: {0}")]
    Link(#[from] LinkError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Link(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Rejected(_) => "invalid_duration",
            ApiError::Persistence(_) => "persistence",
            ApiError::Link(_) => "link",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}
