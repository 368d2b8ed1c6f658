mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;
use crate::notify::{LogNotifier, Notifier};
use middleware::SecurityConfig;

/// Shared state handed to every handler: the database and the notification
/// sender.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
}

pub fn create_router(db: Database) -> Router {
    create_router_with(db, Arc::new(LogNotifier), SecurityConfig::from_env())
}

pub fn create_router_with(
    db: Database,
    notifier: Arc<dyn Notifier>,
    security: SecurityConfig,
) -> Router {
    let state = AppState { db, notifier };

    let mut api = Router::new()
        // Households
        .route("/households", get(handlers::list_households))
        .route("/households", post(handlers::create_household))
        .route("/households/{id}", get(handlers::get_household))
        .route("/households/{id}", put(handlers::update_household))
        .route("/households/{id}", delete(handlers::delete_household))
        .route("/households/{id}/complete-term", post(handlers::complete_leader_term))
        // Exemptions
        .route("/exemptions", get(handlers::list_exemptions))
        .route("/exemptions", post(handlers::create_exemption))
        .route("/exemptions/{id}/approve", post(handlers::approve_exemption))
        .route("/exemptions/{id}/reject", post(handlers::reject_exemption))
        // Schedules & rotation
        .route("/schedules", get(handlers::list_schedules))
        .route("/schedules/{year}", get(handlers::get_schedule))
        .route("/schedules/{year}/calculate", post(handlers::calculate_next_year))
        .route("/schedules/{year}/recalculate", post(handlers::recalculate_schedules))
        .route("/schedules/{year}/rotation", get(handlers::get_rotation_with_reasons))
        .route("/schedules/{year}/advance", post(handlers::advance_schedule))
        // Inquiries
        .route("/inquiries", get(handlers::list_inquiries))
        .route("/inquiries", post(handlers::create_inquiry))
        .route("/inquiries/{id}", get(handlers::get_inquiry))
        .route("/inquiries/{id}/answer", post(handlers::answer_inquiry))
        // FAQ
        .route("/faq", get(handlers::list_faq))
        .route("/faq", post(handlers::create_faq))
        .route("/faq/{id}", get(handlers::get_faq))
        .route("/faq/{id}", put(handlers::update_faq))
        .route("/faq/{id}", delete(handlers::delete_faq))
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/{id}", get(handlers::get_user))
        // Health
        .route("/health", get(handlers::health));

    // Role synchronization runs once per authenticated request, before the
    // handler sees it.
    api = api.layer(from_fn_with_state(
        state.clone(),
        middleware::role_sync_middleware,
    ));

    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    if security.api_key.is_some() {
        api = api.layer(from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));
    }

    let cors = match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
