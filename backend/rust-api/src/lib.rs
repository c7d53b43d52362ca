use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/levels", get(handlers::list_levels))
        .route("/api/stats", get(handlers::stats))
        .route("/api/claims/validate", post(handlers::claims::validate))
        .merge(session_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/game/session", post(handlers::sessions::create_session))
        .route(
            "/api/game/session/{id}",
            get(handlers::sessions::get_session)
                .patch(handlers::sessions::update_session)
                .delete(handlers::sessions::delete_session),
        )
        .route(
            "/api/game/session/{id}/submit",
            post(handlers::sessions::submit_claim),
        )
        .route(
            "/api/game/session/{id}/stream",
            get(handlers::sse::session_stream),
        )
}
