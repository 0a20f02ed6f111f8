use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{
    Group, ImageUpdate, NewGroup, NewPost, NewUser, Post, PostCard, PostChanges, PostFilter, User,
};

use super::BlogRepository;

#[derive(Default)]
struct State {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    next_user_id: i64,
    next_group_id: i64,
    next_post_id: i64,
    last_pub_date: Option<DateTime<Utc>>,
}

impl State {
    fn matches(post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(id),
            PostFilter::Author(id) => post.author_id == id,
        }
    }

    fn card(&self, post: &Post) -> Result<PostCard> {
        let author = self
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "post {} has dangling author {}",
                    post.id,
                    post.author_id
                ))
            })?;
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id));

        Ok(PostCard {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            image: post.image.clone(),
            author_id: author.id,
            author_username: author.username.clone(),
            author_first_name: author.first_name.clone(),
            author_last_name: author.last_name.clone(),
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        })
    }

    fn check_group(&self, group_id: Option<i64>) -> Result<()> {
        match group_id {
            Some(id) if !self.groups.iter().any(|g| g.id == id) => Err(AppError::Conflict(
                "post references a missing record".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Strictly increasing timestamps, so posts created in one burst still order deterministically.
    fn next_pub_date(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let pub_date = match self.last_pub_date {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_pub_date = Some(pub_date);
        pub_date
    }
}

/// Process-local storage with the same semantics as the Postgres schema.
#[derive(Default)]
pub struct MemoryBlogRepository {
    state: RwLock<State>,
}

impl MemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlogRepository for MemoryBlogRepository {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|u| u.username.to_lowercase() == new.username.to_lowercase())
        {
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            date_joined: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .any(|u| u.username.to_lowercase() == username.to_lowercase()))
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn upsert_group(&self, new: NewGroup) -> Result<Group> {
        let mut state = self.state.write().await;
        if let Some(group) = state.groups.iter_mut().find(|g| g.slug == new.slug) {
            group.title = new.title;
            group.description = new.description;
            return Ok(group.clone());
        }

        state.next_group_id += 1;
        let group = Group {
            id: state.next_group_id,
            slug: new.slug,
            title: new.title,
            description: new.description,
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn find_group_by_id(&self, id: i64) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups = state.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_post(&self, new: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == new.author_id) {
            return Err(AppError::Conflict(
                "post references a missing record".to_string(),
            ));
        }
        state.check_group(new.group_id)?;

        state.next_post_id += 1;
        let post = Post {
            id: state.next_post_id,
            text: new.text,
            pub_date: state.next_pub_date(),
            author_id: new.author_id,
            group_id: new.group_id,
            image: new.image,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostCard>> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.card(p))
            .transpose()
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        state.check_group(changes.group_id)?;

        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        match changes.image {
            ImageUpdate::Keep => {}
            ImageUpdate::Replace(path) => post.image = Some(path),
            ImageUpdate::Clear => post.image = None,
        }
        Ok(Some(post.clone()))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .filter(|p| State::matches(p, filter))
            .count())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostCard>> {
        let state = self.state.read().await;
        let mut posts: Vec<&Post> = state
            .posts
            .iter()
            .filter(|p| State::matches(p, filter))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| state.card(p))
            .collect()
    }
}
