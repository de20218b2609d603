mod handlers;
mod middleware;

pub use middleware::{auth_middleware, SecurityConfig};

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::phishing::PhishingService;

/// Build the HTTP router.
///
/// The click route stays open because recipients follow it from their mail
/// client. Sending and listing attempts require the API key when one is set.
pub fn create_router(service: PhishingService, security: SecurityConfig) -> Router {
    let admin = Router::new()
        .route("/phishing/send", post(handlers::send_phishing_email))
        .route("/phishing/attempts", get(handlers::list_attempts))
        .route("/phishing/attempts/{id}", get(handlers::get_attempt))
        .route_layer(from_fn_with_state(security.clone(), auth_middleware));

    let public = Router::new()
        .route("/phishing/click/{id}", get(handlers::record_click))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", admin.merge(public))
        .layer(TraceLayer::new_for_http())
        .layer(security.cors_layer())
        .with_state(service)
}
