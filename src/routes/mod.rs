use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors, require_admin},
};

pub mod admin;
pub mod user;

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route("/users/logout", post(user::logout));

    let admin_routes = Router::new()
        .route("/admin/users/ban", post(admin::ban_user))
        .route("/admin/users/unban", post(admin::unban_user))
        .route("/admin/sessions/shrink", post(admin::shrink_sessions))
        .layer(axum::middleware::from_fn(require_admin));

    let protected_routes = Router::new()
        .route("/users/session", get(user::session_info))
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .nest(
            &state.config.api_base_uri,
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
