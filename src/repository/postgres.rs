use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{
    Group, ImageUpdate, NewGroup, NewPost, NewUser, Post, PostCard, PostChanges, PostFilter, User,
};

use super::BlogRepository;

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, date_joined";

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

const POST_CARD_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.image, p.author_id,
           u.username AS author_username,
           u.first_name AS author_first_name,
           u.last_name AS author_last_name,
           p.group_id,
           g.slug AS group_slug,
           g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// Unique and foreign-key violations become `Conflict`; everything else stays a database error.
fn map_constraint(err: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => return AppError::Conflict(format!("{} already exists", what)),
            Some("23503") => {
                return AppError::Conflict(format!("{} references a missing record", what))
            }
            _ => {}
        }
    }
    AppError::Database(err)
}

/// Split a filter into the `(group_id, author_id)` bind pair used by the listing queries.
fn filter_binds(filter: PostFilter) -> (Option<i64>, Option<i64>) {
    match filter {
        PostFilter::All => (None, None),
        PostFilter::Group(id) => (Some(id), None),
        PostFilter::Author(id) => (None, Some(id)),
    }
}

#[derive(Clone)]
pub struct PgBlogRepository {
    pool: PgPool,
}

impl PgBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BlogRepository for PgBlogRepository {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "user"))?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    async fn upsert_group(&self, new: NewGroup) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (slug, title, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
                SET title = EXCLUDED.title, description = EXCLUDED.description
            RETURNING id, slug, title, description
            "#,
        )
        .bind(&new.slug)
        .bind(&new.title)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM post_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, slug, title, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn create_post(&self, new: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (text, author_id, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&new.text)
        .bind(new.author_id)
        .bind(new.group_id)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "post"))?;

        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostCard>> {
        let post = sqlx::query_as::<_, PostCard>(&format!(
            "{} WHERE p.id = $1",
            POST_CARD_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let (touch_image, image) = match changes.image {
            ImageUpdate::Keep => (false, None),
            ImageUpdate::Replace(path) => (true, Some(path)),
            ImageUpdate::Clear => (true, None),
        };

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET text = $2,
                group_id = $3,
                image = CASE WHEN $4 THEN $5 ELSE image END
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(id)
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(touch_image)
        .bind(image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint(e, "post"))?;

        Ok(post)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let (group_id, author_id) = filter_binds(filter);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE ($1::BIGINT IS NULL OR group_id = $1)
              AND ($2::BIGINT IS NULL OR author_id = $2)
            "#,
        )
        .bind(group_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostCard>> {
        let (group_id, author_id) = filter_binds(filter);
        let posts = sqlx::query_as::<_, PostCard>(&format!(
            r#"
            {}
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
              AND ($2::BIGINT IS NULL OR p.author_id = $2)
            ORDER BY p.pub_date DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#,
            POST_CARD_SELECT
        ))
        .bind(group_id)
        .bind(author_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
