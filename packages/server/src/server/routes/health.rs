//! Liveness of the registration service.

use std::time::{Duration, Instant};

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::server::app::AppState;

const DATABASE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: DatabaseHealth,
    pub registration: RegistrationHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a visitor would get from the sign-up form right now.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationHealth {
    pub mode: String,
    pub open: bool,
    pub email_check: bool,
}

/// Health check endpoint
///
/// 200 while the member tables are reachable, 503 otherwise. Registration
/// settings are reported either way.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = check_database(&state.db_pool).await;

    let settings = &state.deps.settings;
    let registration = RegistrationHealth {
        mode: settings.registration_mode.as_str().to_string(),
        open: settings.registration_mode.is_enabled(),
        email_check: state.deps.email_verifier.is_active(),
    };

    let (status_code, status) = if database.reachable {
        (StatusCode::OK, "healthy")
    } else {
        tracing::warn!(error = ?database.error, "Health check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            database,
            registration,
        }),
    )
}

async fn check_database(pool: &PgPool) -> DatabaseHealth {
    let started = Instant::now();
    let ping = sqlx::query("SELECT 1 FROM members LIMIT 1").fetch_optional(pool);

    match tokio::time::timeout(DATABASE_TIMEOUT, ping).await {
        Ok(Ok(_)) => DatabaseHealth {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Ok(Err(e)) => DatabaseHealth {
            reachable: false,
            latency_ms: None,
            error: Some(e.to_string()),
        },
        Err(_) => DatabaseHealth {
            reachable: false,
            latency_ms: None,
            error: Some(format!("no answer within {}s", DATABASE_TIMEOUT.as_secs())),
        },
    }
}
