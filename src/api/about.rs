use axum::{extract::State, response::Response, routing::get, Router};

use super::render;
use crate::auth::CurrentUser;
use crate::views::View;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/author/", get(author))
        .route("/tech/", get(tech))
}

async fn author(State(state): State<AppState>, user: CurrentUser) -> Response {
    render(&state, &user, View::AboutAuthor)
}

async fn tech(State(state): State<AppState>, user: CurrentUser) -> Response {
    render(&state, &user, View::AboutTech)
}
