//! Test Harness Module
//!
//! Builds the full router over in-memory storage and a temporary media root,
//! and drives it one request at a time with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::auth::hash_password;
use yatube::config::Config;
use yatube::models::{Group, NewGroup, NewPost, NewUser, Post, User};
use yatube::repository::{BlogRepository, MemoryBlogRepository};
use yatube::views::json::JsonRenderer;
use yatube::AppState;

pub const PASSWORD: &str = "harness-pass-1";

/// Test Environment
pub struct TestEnvironment {
    pub repo: Arc<MemoryBlogRepository>,
    pub state: AppState,
    pub media: TempDir,
}

impl TestEnvironment {
    /// Site rendering HTML, as browsers see it.
    pub fn new() -> Self {
        let media = tempfile::tempdir().expect("Failed to create media dir");
        let repo = Arc::new(MemoryBlogRepository::new());
        let config = Config::for_tests(media.path().to_string_lossy().into_owned());
        let state = AppState::new(config, repo.clone());
        Self { repo, state, media }
    }

    /// Same site, but every page is rendered as `{"template", "user", "context"}`.
    pub fn with_json() -> Self {
        let mut env = Self::new();
        env.state = env.state.clone().with_renderer(Arc::new(JsonRenderer));
        env
    }

    pub async fn create_user(&self, username: &str) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{}@example.com", username.to_lowercase()),
                password_hash: hash_password(PASSWORD).expect("Failed to hash password"),
            })
            .await
            .expect("Failed to create user")
    }

    pub async fn create_group(&self, slug: &str, title: &str) -> Group {
        self.repo
            .upsert_group(NewGroup {
                slug: slug.to_string(),
                title: title.to_string(),
                description: "Test description".to_string(),
            })
            .await
            .expect("Failed to create group")
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("Failed to create post")
    }

    /// `Cookie` header value that logs the request in as `user`.
    pub fn session_cookie(&self, user: &User) -> String {
        let token = self
            .state
            .sessions
            .issue_token(user)
            .expect("Failed to issue token");
        format!("{}={}", self.state.sessions.cookie_name(), token)
    }

    pub async fn post_count(&self) -> usize {
        self.repo
            .count_posts(yatube::models::PostFilter::All)
            .await
            .expect("Failed to count posts")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = yatube::app(self.state.clone())
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// urlencoded body, as the account forms submit.
    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        body: MultipartBody,
    ) -> TestResponse {
        let (content_type, bytes) = body.finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(bytes)).unwrap()).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Body of a page rendered by `JsonRenderer`.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Body is not JSON")
    }

    /// `name=value` of the first `Set-Cookie` header.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// Minimal multipart/form-data encoder for the post form.
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "yatube-test-boundary".to_string(),
            bytes: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.bytes,
        )
    }
}

/// A tiny valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(2, 2)
        .write_to(&mut cursor, image::ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    cursor.into_inner()
}
