use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::models::*;
use crate::phishing::{PhishingError, PhishingService};

// ============================================================
// Error Handling
// ============================================================

/// Map a service error to a status and client-facing message.
/// Store failures are logged in full but only a generic message is returned.
fn phishing_error(e: PhishingError) -> (StatusCode, String) {
    match e {
        PhishingError::InvalidEmail => (StatusCode::BAD_REQUEST, e.to_string()),
        PhishingError::SendFailed(_) => {
            tracing::warn!("{}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
        PhishingError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        PhishingError::Store(err) => {
            tracing::error!("Internal error: {:#}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Phishing attempts
// ============================================================

pub async fn send_phishing_email(
    State(service): State<PhishingService>,
    Json(input): Json<SendPhishingInput>,
) -> Result<(StatusCode, Json<Attempt>), (StatusCode, String)> {
    service
        .send_phishing_email(&input.email)
        .await
        .map(|a| (StatusCode::CREATED, Json(a)))
        .map_err(phishing_error)
}

pub async fn record_click(
    State(service): State<PhishingService>,
    Path(id): Path<String>,
) -> Result<Json<Attempt>, (StatusCode, String)> {
    service.record_click(&id).map(Json).map_err(phishing_error)
}

pub async fn get_attempt(
    State(service): State<PhishingService>,
    Path(id): Path<String>,
) -> Result<Json<Attempt>, (StatusCode, String)> {
    service.get_attempt(&id).map(Json).map_err(phishing_error)
}

pub async fn list_attempts(
    State(service): State<PhishingService>,
    Query(filter): Query<AttemptFilter>,
) -> Result<Json<Vec<Attempt>>, (StatusCode, String)> {
    service
        .list_attempts(&filter)
        .map(Json)
        .map_err(phishing_error)
}
