//! Groups endpoints.
//!
//! Groups are read-only over the API; they are provisioned out of band.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_db::entities::group;
use serde::Serialize;

use crate::{
    extractors::PageQuery,
    middleware::AppState,
    response::{ApiResponse, PageResponse},
};

use super::posts::PostResponse;

/// Group response.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupResponse {
    fn from(group: group::Model) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

/// A group with one page of its feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFeedResponse {
    pub group: GroupResponse,
    pub posts: PageResponse<PostResponse>,
}

/// List all groups, ordered by title.
async fn index(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<GroupResponse>>> {
    let groups = state.group_service.list().await?;

    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

/// Show one group by slug.
async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.get_by_slug(&slug).await?;

    Ok(ApiResponse::ok(group.into()))
}

/// One page of a group's feed, oldest first.
async fn posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<GroupFeedResponse>> {
    let feed = state
        .post_service
        .group_feed(&slug, query.request())
        .await?;

    Ok(ApiResponse::ok(GroupFeedResponse {
        group: feed.group.into(),
        posts: PageResponse::from_page(feed.page, Into::into),
    }))
}

/// Create the groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{slug}", get(show))
        .route("/{slug}/posts", get(posts))
}
