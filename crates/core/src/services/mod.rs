//! Business logic services.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentService, CreateCommentInput};
pub use follow::{FollowOutcome, FollowService};
pub use group::GroupService;
pub use post::{
    CreatePostInput, GroupFeed, PostDetail, PostService, ProfileFeed, UpdatePostInput,
};
pub use user::UserService;
