use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::user::display_name;

/// Row of the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Post joined with its author and group, as shown in listings and on the detail page.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl PostCard {
    pub fn author_name(&self) -> String {
        display_name(
            &self.author_username,
            &self.author_first_name,
            &self.author_last_name,
        )
    }

    pub fn is_written_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    Keep,
    Replace(String),
    Clear,
}

/// Fields an author may change on an existing post. `pub_date` and author never change.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
}
