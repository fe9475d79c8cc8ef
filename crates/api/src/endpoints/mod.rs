//! API endpoints.

mod auth;
mod comments;
mod posts;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(comments::router())
        .nest("/auth", auth::router())
}
