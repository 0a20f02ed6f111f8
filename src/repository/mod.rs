mod memory;
mod postgres;

pub use memory::MemoryBlogRepository;
pub use postgres::PgBlogRepository;

use crate::error::Result;
use crate::models::{
    Group, NewGroup, NewPost, NewUser, Post, PostCard, PostChanges, PostFilter, User,
};

/// Storage operations the site needs.
/// `PgBlogRepository` backs production; `MemoryBlogRepository` backs tests and demo mode.
#[async_trait::async_trait]
pub trait BlogRepository: Send + Sync {
    /// Insert a user. Fails with `AppError::Conflict` if the username is taken.
    async fn create_user(&self, new: NewUser) -> Result<User>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Exact, case-sensitive lookup.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive existence check used by signup.
    async fn username_taken(&self, username: &str) -> Result<bool>;

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()>;

    /// Insert a group, or update title/description when the slug already exists.
    async fn upsert_group(&self, new: NewGroup) -> Result<Group>;

    async fn find_group_by_id(&self, id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title, for the group selector on the post form.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Insert a post; storage assigns `id` and `pub_date`.
    async fn create_post(&self, new: NewPost) -> Result<Post>;

    async fn find_post(&self, id: i64) -> Result<Option<PostCard>>;

    /// Apply author edits. Returns `None` if the post no longer exists.
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<usize>;

    /// Posts matching `filter`, newest first (`pub_date DESC, id DESC`).
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostCard>>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
