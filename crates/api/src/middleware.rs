//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use quill_core::{CommentService, FollowService, GroupService, PostService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// User lookup and token authentication.
    pub user_service: UserService,
    /// Posts and feeds.
    pub post_service: PostService,
    /// Comments on posts.
    pub comment_service: CommentService,
    /// Follow relationships.
    pub follow_service: FollowService,
    /// Group resolution and listing.
    pub group_service: GroupService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user and stores it in request extensions;
/// routes decide via [`crate::extractors::AuthUser`] whether auth is
/// required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
