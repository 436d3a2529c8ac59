//! API integration tests.
//!
//! These tests drive the router end to end over a mock database, staging
//! the exact query results each request consumes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::Utc;
use quill_api::{AppState, auth_middleware, router as api_router};
use quill_common::PaginationConfig;
use quill_core::{CommentService, FollowService, GroupService, PostService, UserService};
use quill_db::entities::{follow, group, post, user};
use quill_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

fn test_user(id: &str, username: &str, token: Option<&str>) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: username.to_string(),
        username_lower: username.to_lowercase(),
        token: token.map(ToString::to_string),
        name: None,
        bio: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_post(id: &str, author_id: &str, text: &str) -> post::Model {
    post::Model {
        id: id.to_string(),
        author_id: author_id.to_string(),
        text: text.to_string(),
        image_url: None,
        group_id: None,
        published_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_group(id: &str, slug: &str) -> group::Model {
    group::Model {
        id: id.to_string(),
        title: "Rustaceans".to_string(),
        slug: slug.to_string(),
        description: "All things crab".to_string(),
        created_at: Utc::now().into(),
    }
}

fn test_follow(id: &str, user_id: &str, author_id: &str) -> follow::Model {
    follow::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        author_id: author_id.to_string(),
        created_at: Utc::now().into(),
    }
}

/// A `SELECT COUNT(*)` result row as the paginator reads it.
fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

/// Build the full app over a prepared mock connection.
fn build_app(db: DatabaseConnection) -> Router {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    let state = AppState {
        user_service: UserService::new(user_repo.clone()),
        post_service: PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            comment_repo.clone(),
            follow_repo.clone(),
            PaginationConfig::default(),
        ),
        comment_service: CommentService::new(comment_repo, post_repo),
        follow_service: FollowService::new(follow_repo, user_repo),
        group_service: GroupService::new(group_repo),
    };

    Router::new()
        .merge(api_router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn empty_app() -> Router {
    build_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_post_requires_auth() {
    let response = empty_app()
        .oneshot(
            Request::builder()
                .uri("/posts")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"text":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_timeline_requires_auth() {
    let response = empty_app()
        .oneshot(
            Request::builder()
                .uri("/timeline")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_edit_post_requires_auth() {
    let response = empty_app()
        .oneshot(
            Request::builder()
                .uri("/posts/p1")
                .method("PUT")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"text":"edited"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_post_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts/nope")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "POST_NOT_FOUND");
}

#[tokio::test]
async fn test_global_feed_returns_requested_page() {
    // 12 posts at 10 per page leaves one on page 2
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(12)]])
        .append_query_results([vec![test_post("p12", "u1", "latest")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts?page=2")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["page"], 2);
    assert_eq!(data["perPage"], 10);
    assert_eq!(data["totalPages"], 2);
    assert_eq!(data["totalItems"], 12);
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(data["items"][0]["id"], "p12");
}

#[tokio::test]
async fn test_feed_page_param_falls_back_on_garbage() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(1)]])
        .append_query_results([vec![test_post("p1", "u1", "hello")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts?page=garbage")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"], 1);
}

#[tokio::test]
async fn test_group_show_returns_group() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_group("g1", "rust")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/groups/rust")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "rust");
    assert_eq!(json["data"]["title"], "Rustaceans");
}

#[tokio::test]
async fn test_unknown_group_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<group::Model>::new()])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/groups/nope")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "GROUP_NOT_FOUND");
}

#[tokio::test]
async fn test_anonymous_profile_reports_not_following() {
    let bob = test_user("u2", "bob", None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bob]])
        .append_query_results([vec![count_row(1)], vec![count_row(1)]])
        .append_query_results([vec![test_post("p1", "u2", "bob's post")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/users/bob")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["author"]["username"], "bob");
    assert_eq!(data["following"], false);
    assert_eq!(data["postsCount"], 1);
    assert_eq!(data["posts"]["items"][0]["id"], "p1");
}

#[tokio::test]
async fn test_follow_self_is_reported_not_created() {
    let alice = test_user("u1", "alice", Some("tok-alice"));
    // Token lookup, then author resolution hit the same user
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![alice.clone()], vec![alice]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/users/alice/follow")
                .method("POST")
                .header("Authorization", "Bearer tok-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "self");
}

#[tokio::test]
async fn test_follow_creates_relationship() {
    let alice = test_user("u1", "alice", Some("tok-alice"));
    let bob = test_user("u2", "bob", None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![alice], vec![bob]])
        .append_query_results([Vec::<follow::Model>::new(), vec![test_follow("f1", "u1", "u2")]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/users/bob/follow")
                .method("POST")
                .header("Authorization", "Bearer tok-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "following");
}

#[tokio::test]
async fn test_unfollow_unknown_author_returns_404() {
    let alice = test_user("u1", "alice", Some("tok-alice"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![alice], Vec::<user::Model>::new()])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/users/ghost/follow")
                .method("DELETE")
                .header("Authorization", "Bearer tok-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_comment_on_missing_post_returns_404() {
    let alice = test_user("u1", "alice", Some("tok-alice"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![alice]])
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    // Missing post wins over the invalid empty text
    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts/nope/comments")
                .method("POST")
                .header("Authorization", "Bearer tok-alice")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"text":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_comment_returns_validation_error() {
    let alice = test_user("u1", "alice", Some("tok-alice"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![alice]])
        .append_query_results([vec![test_post("p1", "u2", "hello")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts/p1/comments")
                .method("POST")
                .header("Authorization", "Bearer tok-alice")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"text":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_edit_by_non_author_is_forbidden() {
    let mallory = test_user("u2", "mallory", Some("tok-mallory"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![mallory]])
        .append_query_results([vec![test_post("p1", "u1", "hello")]])
        .into_connection();

    let response = build_app(db)
        .oneshot(
            Request::builder()
                .uri("/posts/p1")
                .method("PUT")
                .header("Authorization", "Bearer tok-mallory")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"text":"defaced"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let response = empty_app()
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
