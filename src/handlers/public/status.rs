use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - Service banner with the route map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Gradebook API",
            "version": version,
            "description": "Grade bookkeeping, academic summaries and report cards",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "grades": "/api/grades[/:id] (protected)",
                "summary": "/api/grades/student/:student/:cycle (protected)",
                "roster": "/api/grades/roster/:course/:subject/:period?cycle= (protected)",
                "transcript": "/api/grades/transcript/:student/:cycle (protected, PDF)",
            }
        }
    }))
}

/// GET /health - Store connectivity check
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.grades.health_check().await.map_err(|e| {
        tracing::error!("health check failed: {}", e);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}
