//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use crate::pagination::{Page, PageRequest, fetch_page};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};

/// Post repository for database operations.
///
/// Every feed query orders ascending by publish timestamp (oldest first,
/// matching the product's historical feed order) and is windowed through
/// [`fetch_page`].
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of the global feed (all posts).
    pub async fn page_all(
        &self,
        request: PageRequest,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        fetch_page(self.db.as_ref(), feed_query(), request, per_page).await
    }

    /// One page of a group's feed.
    pub async fn page_by_group(
        &self,
        group_id: &str,
        request: PageRequest,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        let query = feed_query().filter(post::Column::GroupId.eq(group_id));
        fetch_page(self.db.as_ref(), query, request, per_page).await
    }

    /// One page of an author's feed.
    pub async fn page_by_author(
        &self,
        author_id: &str,
        request: PageRequest,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        let query = feed_query().filter(post::Column::AuthorId.eq(author_id));
        fetch_page(self.db.as_ref(), query, request, per_page).await
    }

    /// One page of posts by any of the given authors (follow feed).
    pub async fn page_by_authors(
        &self,
        author_ids: &[String],
        request: PageRequest,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        if author_ids.is_empty() {
            return Ok(Page {
                items: vec![],
                page: 1,
                per_page: per_page.max(1),
                total_pages: 1,
                total_items: 0,
            });
        }

        let query = feed_query().filter(post::Column::AuthorId.is_in(author_ids.to_vec()));
        fetch_page(self.db.as_ref(), query, request, per_page).await
    }
}

/// Base feed select: all posts ordered ascending by publish timestamp.
fn feed_query() -> Select<Post> {
    Post::find().order_by_asc(post::Column::PublishedAt)
}
