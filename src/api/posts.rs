use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use super::render;
use crate::auth::CurrentUser;
use crate::error::{found, AppError, Result};
use crate::forms::PostForm;
use crate::pagination::parse_page_number;
use crate::services::{PostService, Submission};
use crate::views::{PostFormView, View};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(edit_form).post(edit_post))
        .route("/create/", get(create_form).post(create_post))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Raw value; anything that is not an integer means the first page.
    pub page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> i64 {
        parse_page_number(self.page.as_deref())
    }
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.repo.clone(), state.media.clone())
}

/// Post ids in paths are integers; anything else is an unknown page.
fn parse_post_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("post {}", raw)))
}

fn form_response(
    state: &AppState,
    user: &CurrentUser,
    outcome: Submission<String, PostFormView>,
) -> Response {
    match outcome {
        Submission::Accepted(location) => found(location),
        Submission::Rejected(view) => render(state, user, View::PostForm(view)),
    }
}

async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let view = post_service(&state).index(query.number()).await?;
    Ok(render(&state, &user, View::Index(view)))
}

async fn group_posts(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let view = post_service(&state)
        .group_posts(&slug, query.number())
        .await?;
    Ok(render(&state, &user, View::GroupList(view)))
}

async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let view = post_service(&state)
        .profile(&username, query.number())
        .await?;
    Ok(render(&state, &user, View::Profile(view)))
}

async fn post_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let view = post_service(&state)
        .post_detail(parse_post_id(&post_id)?)
        .await?;
    Ok(render(&state, &user, View::PostDetail(view)))
}

async fn create_form(State(state): State<AppState>, user: CurrentUser) -> Result<Response> {
    let view = post_service(&state).create_form(user.caller()).await?;
    Ok(render(&state, &user, View::PostForm(view)))
}

/// Parse the submitted form. Called only once the caller is known to be allowed,
/// so body problems never mask a login or author redirect.
async fn read_form(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<PostForm> {
    let multipart =
        multipart.map_err(|e| AppError::BadRequest(format!("Expected multipart form: {}", e)))?;
    PostForm::from_multipart(multipart).await
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let service = post_service(&state);
    service.authorize_create(user.caller())?;

    let form = read_form(multipart).await?;
    let outcome = service.create(user.caller(), form).await?;
    Ok(form_response(&state, &user, outcome))
}

async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Response> {
    let view = post_service(&state)
        .edit_form(user.caller(), parse_post_id(&post_id)?)
        .await?;
    Ok(render(&state, &user, View::PostForm(view)))
}

async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let post_id = parse_post_id(&post_id)?;
    let service = post_service(&state);
    service.authorize_edit(user.caller(), post_id).await?;

    let form = read_form(multipart).await?;
    let outcome = service.edit(user.caller(), post_id, form).await?;
    Ok(form_response(&state, &user, outcome))
}
