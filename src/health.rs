use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::AppState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Debug)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Reports process and database health. Returns 503 when the database
/// does not answer a ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.db.ping().await {
        Ok(()) => HealthStatus::Up,
        Err(e) => {
            error!("Database ping failed: {}", e);
            HealthStatus::Down
        }
    };

    let status = if database == HealthStatus::Up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let info = HealthInfo {
        status: if database == HealthStatus::Up {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        },
        database,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    };

    (status, Json(info))
}
