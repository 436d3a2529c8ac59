//! Users endpoints: profiles and follow relationships.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use quill_common::AppResult;
use quill_core::FollowOutcome;
use quill_db::entities::user;
use serde::Serialize;
use tracing::debug;

use crate::{
    extractors::{AuthUser, MaybeAuthUser, PageQuery},
    middleware::AppState,
    response::{ApiResponse, PageResponse, ok},
};

use super::posts::PostResponse;

/// User response.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            bio: user.bio,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Profile response: the author, follow state, post count, and one feed
/// page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub author: UserResponse,
    /// Whether the caller follows this author. Always false for anonymous
    /// callers.
    pub following: bool,
    pub posts_count: u64,
    pub posts: PageResponse<PostResponse>,
}

/// Follow response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub status: &'static str,
}

impl From<FollowOutcome> for FollowResponse {
    fn from(outcome: FollowOutcome) -> Self {
        let status = match outcome {
            FollowOutcome::Followed => "following",
            FollowOutcome::AlreadyFollowing => "already_following",
            FollowOutcome::SelfFollow => "self",
        };
        Self { status }
    }
}

/// Show an author's profile with one page of their posts.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let feed = state
        .post_service
        .profile_feed(viewer_id, &username, query.request())
        .await?;

    Ok(ApiResponse::ok(ProfileResponse {
        author: feed.author.into(),
        following: feed.following,
        posts_count: feed.posts_count,
        posts: PageResponse::from_page(feed.page, Into::into),
    }))
}

/// Follow an author. Following yourself or an author you already follow
/// is a no-op reported in the outcome.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let outcome = state.follow_service.follow(&user.id, &username).await?;
    debug!(user_id = %user.id, author = %username, ?outcome, "Follow requested");

    Ok(ApiResponse::ok(outcome.into()))
}

/// Unfollow an author. Unfollowing someone not followed is a no-op.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.follow_service.unfollow(&user.id, &username).await?;

    Ok(ok())
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(show))
        .route("/{username}/follow", post(follow).delete(unfollow))
}
