use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::views::html;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Protected page requested without a session; `next` is where to return after login.
    #[error("Authentication required")]
    LoginRequired { next: String },

    /// Logged-in caller tried to edit a post they did not write.
    #[error("Post {post_id} belongs to another author")]
    NotAuthor { post_id: i64 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::LoginRequired { .. } | AppError::NotAuthor { .. } => StatusCode::FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 302 with a `Location` header, the status the site uses for every redirect.
pub fn found(location: impl AsRef<str>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.as_ref().to_string())]).into_response()
}

/// Login page URL carrying the original destination.
pub fn login_url(next: &str) -> String {
    format!(
        "/auth/login/?next={}",
        urlencoding::encode(next).replace("%2F", "/")
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            AppError::LoginRequired { next } => found(login_url(&next)),
            AppError::NotAuthor { post_id } => found(format!("/posts/{}/", post_id)),
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                (status, Html(html::error_page(status, "Page not found"))).into_response()
            }
            AppError::BadRequest(msg) => {
                (status, Html(html::error_page(status, &msg))).into_response()
            }
            AppError::Conflict(msg) => {
                (status, Html(html::error_page(status, &msg))).into_response()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (status, Html(html::error_page(status, "Server error"))).into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (status, Html(html::error_page(status, "Server error"))).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_path_separators() {
        assert_eq!(login_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(
            login_url("/posts/7/edit/"),
            "/auth/login/?next=/posts/7/edit/"
        );
    }

    #[test]
    fn login_url_escapes_query_characters() {
        assert_eq!(login_url("/?page=2"), "/auth/login/?next=/%3Fpage%3D2");
    }

    #[test]
    fn not_author_redirects_to_detail() {
        let response = AppError::NotAuthor { post_id: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/posts/3/");
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound("group nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
