pub mod media;
pub mod scores;

use crate::{AppError, AppState, Result};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "app": "multimedia-backend"
    }))
}

pub async fn test_connection() -> &'static str {
    "Server is up!"
}

/// Public IP of this server as reported by the configured lookup service.
pub async fn my_ip(State(state): State<Arc<AppState>>) -> Result<String> {
    let response = state
        .http
        .get(&state.config.public_ip_url)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("IP lookup failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "IP lookup returned {}",
            status
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to read IP lookup response: {}", e)))?;

    Ok(body.trim().to_string())
}
