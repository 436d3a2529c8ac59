//! Posts endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use quill_common::AppResult;
use quill_core::{CreateCommentInput, CreatePostInput, UpdatePostInput};
use quill_db::entities::{comment, post};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    extractors::{AuthUser, PageQuery},
    middleware::AppState,
    response::{ApiResponse, PageResponse},
};

/// Post response.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub image_url: Option<String>,
    pub group_id: Option<String>,
    pub published_at: String,
    pub updated_at: Option<String>,
}

impl From<post::Model> for PostResponse {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            text: post.text,
            image_url: post.image_url,
            group_id: post.group_id,
            published_at: post.published_at.to_rfc3339(),
            updated_at: post.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Comment response.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Post detail response: the post, its comments, and the author's total
/// post count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub author_posts_count: u64,
}

/// Create post request.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(flatten)]
    pub input: CreatePostInput,
}

/// Update post request.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(flatten)]
    pub input: UpdatePostInput,
}

/// Create comment request.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(flatten)]
    pub input: CreateCommentInput,
}

/// One page of the global feed, oldest first.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<PageResponse<PostResponse>>> {
    let page = state.post_service.global_feed(query.request()).await?;

    Ok(ApiResponse::ok(PageResponse::from_page(page, Into::into)))
}

/// Create a new post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user.id, req.input).await?;
    debug!(post_id = %post.id, author_id = %user.id, "Created post");

    Ok(ApiResponse::ok(post.into()))
}

/// Show one post with its comments.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostDetailResponse>> {
    let detail = state.post_service.detail(&id).await?;

    Ok(ApiResponse::ok(PostDetailResponse {
        post: detail.post.into(),
        comments: detail.comments.into_iter().map(Into::into).collect(),
        author_posts_count: detail.author_posts_count,
    }))
}

/// Edit an existing post. Only the author may edit.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(&user.id, &id, req.input).await?;

    Ok(ApiResponse::ok(post.into()))
}

/// List a post's comments, oldest first.
async fn comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_for_post(&id).await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(Into::into).collect(),
    ))
}

/// Add a comment to a post.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.add(&user.id, &id, req.input).await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// Create the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).put(update))
        .route("/{id}/comments", get(comments).post(add_comment))
}
