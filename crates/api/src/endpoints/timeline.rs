//! Follow-feed timeline endpoint.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use quill_common::AppResult;

use crate::{
    extractors::{AuthUser, PageQuery},
    middleware::AppState,
    response::{ApiResponse, PageResponse},
};

use super::posts::PostResponse;

/// One page of the caller's follow feed: posts by authors they follow,
/// oldest first.
async fn index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<PageResponse<PostResponse>>> {
    let page = state
        .post_service
        .follow_feed(&user.id, query.request())
        .await?;

    Ok(ApiResponse::ok(PageResponse::from_page(page, Into::into)))
}

/// Create the timeline router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}
