use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use proxlib_core::ServerConfig;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{admin_handlers, auth_handlers, middleware as auth_middleware, AppState};

/// API routes
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(|| async { "ProxLib API running" }))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/admin/login", post(auth_handlers::admin_login));

    // Admin routes (require an admin token)
    let admin_routes = Router::new()
        .route("/admin/users", get(admin_handlers::list_users))
        .route("/admin/users/{id}/rating", put(admin_handlers::update_rating))
        .route("/admin/users/{id}", delete(admin_handlers::delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: API routes, optional single-page UI and CORS
pub fn app(state: Arc<AppState>, server: &ServerConfig) -> Result<Router, header::InvalidHeaderValue> {
    let mut app = router(state);

    if let Some(dir) = &server.static_dir {
        // Unknown paths fall back to index.html so client-side routes resolve
        let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    let cors = match &server.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(HeaderValue::from_str(origin)?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        None => CorsLayer::permissive(),
    };

    Ok(app.layer(cors))
}
