//! API endpoints.

mod groups;
mod posts;
mod timeline;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/groups", groups::router())
        .nest("/users", users::router())
        .nest("/timeline", timeline::router())
}
