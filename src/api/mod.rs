mod about;
mod accounts;
mod posts;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::views::{RenderContext, View};
use crate::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let media = ServeDir::new(state.media.root());

    Router::new()
        .route("/health", get(health_check))
        .merge(posts::routes())
        .nest("/auth", accounts::routes())
        .nest("/about", about::routes())
        .nest_service(state.media.url_prefix(), media)
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
}

async fn health_check(State(state): State<AppState>) -> Result<&'static str> {
    state.repo.health_check().await?;
    Ok("OK")
}

/// Render a page for the current caller with the configured renderer.
fn render(state: &AppState, user: &CurrentUser, view: View) -> Response {
    let body = state.renderer.render(
        &view,
        RenderContext {
            caller: user.caller(),
        },
    );
    ([(header::CONTENT_TYPE, state.renderer.content_type())], body).into_response()
}
