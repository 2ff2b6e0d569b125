use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, system};

/// All application routes
pub fn configure_routes() -> Router {
    // Everything below requires a valid bearer token
    let protected = Router::new()
        .route("/api/auth/me", get(system::handlers::auth::current_user))
        .route("/api/users", get(system::handlers::users::list))
        // ========================================
        // AUDIT LOG
        // ========================================
        .route("/api/logs", get(handlers::a001_audit_log::list_logs))
        .route(
            "/api/logs/export/excel",
            get(handlers::a001_audit_log::export_excel),
        )
        .route(
            "/api/logs/export/pdf",
            get(handlers::a001_audit_log::export_pdf),
        )
        .route_layer(middleware::from_fn(system::auth::middleware::require_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth/login", post(system::handlers::auth::login))
        .merge(protected)
}
