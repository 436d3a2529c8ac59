//! Post service.

use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator, PaginationConfig};
use quill_db::{
    entities::{comment, group, post, user},
    pagination::{Page, PageRequest},
    repositories::{CommentRepository, FollowRepository, GroupRepository, PostRepository,
        UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a new post.
///
/// There is deliberately no author field: the author is always the
/// authenticated caller.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, message = "Post text must not be empty"))]
    pub text: String,

    /// Group to publish into (optional).
    pub group_id: Option<String>,

    /// Attached image URL (optional).
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
}

/// Input for editing a post.
///
/// The clearable fields distinguish an absent key (no change) from an
/// explicit `null` (remove the value).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    /// New text (None = no change).
    #[validate(length(min = 1, message = "Post text must not be empty"))]
    pub text: Option<String>,

    /// New group (None = no change, Some(None) = remove from group).
    #[serde(default, deserialize_with = "clearable")]
    pub group_id: Option<Option<String>>,

    /// New image URL (None = no change, Some(None) = remove).
    #[serde(default, deserialize_with = "clearable")]
    #[validate(length(max = 1024))]
    pub image_url: Option<Option<String>>,
}

/// Deserialize a field so that a present `null` becomes `Some(None)`.
///
/// A plain `Option<Option<T>>` collapses `null` into the outer `None`;
/// combined with `#[serde(default)]` this keeps the outer `None` for an
/// absent key only.
fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A post with its comments and the author's total post count.
#[derive(Debug, Clone)]
pub struct PostDetail {
    /// The post itself.
    pub post: post::Model,
    /// All comments, oldest first.
    pub comments: Vec<comment::Model>,
    /// Total number of posts by this post's author.
    pub author_posts_count: u64,
}

/// A group together with one page of its feed.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    /// The resolved group.
    pub group: group::Model,
    /// One page of the group's posts.
    pub page: Page<post::Model>,
}

/// An author profile: the user, follow state, post count, and one feed page.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    /// The profile's author.
    pub author: user::Model,
    /// Whether the viewer follows this author (false for anonymous viewers).
    pub following: bool,
    /// Total number of posts by this author.
    pub posts_count: u64,
    /// One page of the author's posts.
    pub page: Page<post::Model>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    comment_repo: CommentRepository,
    follow_repo: FollowRepository,
    pagination: PaginationConfig,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        comment_repo: CommentRepository,
        follow_repo: FollowRepository,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            comment_repo,
            follow_repo,
            pagination,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post authored by `author_id`.
    ///
    /// The author is always the authenticated caller; input carries no
    /// author field to override it.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        // Unknown group is a 404, matching the group feed route
        if let Some(ref group_id) = input.group_id {
            self.group_repo.get_by_id(group_id).await?;
        }

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            text: Set(input.text),
            image_url: Set(input.image_url),
            group_id: Set(input.group_id),
            ..Default::default()
        };

        let post = self.post_repo.create(model).await?;
        tracing::debug!(post_id = %post.id, author_id = %author_id, "Created post");

        Ok(post)
    }

    /// Edit an existing post.
    ///
    /// Only the post's author may edit it; anyone else gets Forbidden. The
    /// author is never reassigned.
    pub async fn update(
        &self,
        actor_id: &str,
        post_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;

        if post.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can edit a post".to_string(),
            ));
        }

        if let Some(Some(ref group_id)) = input.group_id {
            self.group_repo.get_by_id(group_id).await?;
        }

        let mut model: post::ActiveModel = post.into();
        if let Some(text) = input.text {
            model.text = Set(text);
        }
        if let Some(group_id) = input.group_id {
            model.group_id = Set(group_id);
        }
        if let Some(image_url) = input.image_url {
            model.image_url = Set(image_url);
        }
        model.updated_at = Set(Some(Utc::now().into()));

        let updated = self.post_repo.update(model).await?;
        tracing::debug!(post_id = %updated.id, "Updated post");

        Ok(updated)
    }

    /// Load a post with its comments and the author's total post count.
    pub async fn detail(&self, post_id: &str) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let comments = self.comment_repo.find_by_post(post_id).await?;
        let author_posts_count = self.post_repo.count_by_author(&post.author_id).await?;

        Ok(PostDetail {
            post,
            comments,
            author_posts_count,
        })
    }

    /// One page of the global feed: all posts, oldest first.
    pub async fn global_feed(&self, request: PageRequest) -> AppResult<Page<post::Model>> {
        self.post_repo
            .page_all(request, self.pagination.page_size)
            .await
    }

    /// One page of a group's feed, resolved by slug.
    pub async fn group_feed(&self, slug: &str, request: PageRequest) -> AppResult<GroupFeed> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let page = self
            .post_repo
            .page_by_group(&group.id, request, self.pagination.page_size)
            .await?;

        Ok(GroupFeed { group, page })
    }

    /// An author's profile feed, resolved by username.
    ///
    /// `viewer_id` is the authenticated caller, if any; the `following`
    /// flag is false for anonymous viewers.
    pub async fn profile_feed(
        &self,
        viewer_id: Option<&str>,
        username: &str,
        request: PageRequest,
    ) -> AppResult<ProfileFeed> {
        let author = self.user_repo.get_by_username(username).await?;

        let following = match viewer_id {
            Some(viewer) => self.follow_repo.is_following(viewer, &author.id).await?,
            None => false,
        };

        let posts_count = self.post_repo.count_by_author(&author.id).await?;
        let page = self
            .post_repo
            .page_by_author(&author.id, request, self.pagination.page_size)
            .await?;

        Ok(ProfileFeed {
            author,
            following,
            posts_count,
            page,
        })
    }

    /// One page of the caller's follow feed: posts by authors they follow,
    /// with its own configured page size.
    pub async fn follow_feed(
        &self,
        user_id: &str,
        request: PageRequest,
    ) -> AppResult<Page<post::Model>> {
        let author_ids = self.follow_repo.author_ids_followed_by(user_id).await?;
        self.post_repo
            .page_by_authors(&author_ids, request, self.pagination.follow_feed_page_size)
            .await
    }
}
