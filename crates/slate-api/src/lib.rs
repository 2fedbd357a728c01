pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod snapshots;
pub mod validate;
pub mod whiteboards;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};

use slate_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub secure_cookies: bool,
}

/// Full API surface. CORS and tracing layers are the binary's concern; tests
/// drive this router directly.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/whiteboards", post(whiteboards::create_whiteboard))
        .route("/whiteboards/my-whiteboards", get(whiteboards::my_whiteboards))
        .route("/whiteboards/shared-with-me", get(whiteboards::shared_with_me))
        .route("/whiteboards/{id}", get(whiteboards::get_whiteboard))
        .route("/whiteboards/{id}", patch(whiteboards::rename_whiteboard))
        .route("/whiteboards/{id}", delete(whiteboards::delete_whiteboard))
        .route("/whiteboards/{id}/duplicate", post(whiteboards::duplicate_whiteboard))
        .route("/whiteboards/{id}/collaborators", post(whiteboards::add_collaborator))
        .route("/whiteboards/{id}/collaborators", delete(whiteboards::remove_collaborator))
        .route("/whiteboards/{id}/snapshots", post(snapshots::save_snapshot))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

pub async fn health() -> &'static str {
    "ok"
}
