use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::render;
use crate::auth::CurrentUser;
use crate::error::{found, Result};
use crate::forms::{LoginForm, PasswordChangeForm, SignupForm};
use crate::services::{AccountService, Submission};
use crate::views::{LoginView, SignupView, View};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup/", get(signup_form).post(signup))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout).post(logout))
        .route(
            "/password_change/",
            get(password_change_form).post(password_change),
        )
        .route("/password_change/done/", get(password_change_done))
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(state.repo.clone())
}

async fn signup_form(State(state): State<AppState>, user: CurrentUser) -> Response {
    render(&state, &user, View::Signup(SignupView::default()))
}

async fn signup(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    match account_service(&state).signup(form).await? {
        Submission::Accepted(created) => {
            let jar = state.sessions.login(jar, &created)?;
            Ok((jar, found("/")).into_response())
        }
        Submission::Rejected(view) => Ok(render(&state, &user, View::Signup(view))),
    }
}

async fn login_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NextQuery>,
) -> Response {
    let view = LoginView {
        form: LoginForm {
            next: query.next,
            ..Default::default()
        },
        ..Default::default()
    };
    render(&state, &user, View::Login(view))
}

async fn login(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response> {
    if form.next.as_deref().map_or(true, str::is_empty) {
        form.next = query.next;
    }
    let target = form.redirect_target();

    match account_service(&state).login(form).await? {
        Submission::Accepted(account) => {
            let jar = state.sessions.login(jar, &account)?;
            Ok((jar, found(target)).into_response())
        }
        Submission::Rejected(view) => Ok(render(&state, &user, View::Login(view))),
    }
}

async fn logout(State(state): State<AppState>, user: CurrentUser, jar: CookieJar) -> Response {
    if let Some(caller) = user.caller() {
        tracing::info!(user_id = caller.id, "User logged out");
    }
    let jar = state.sessions.logout(jar);
    (jar, render(&state, &CurrentUser::default(), View::LoggedOut)).into_response()
}

async fn password_change_form(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response> {
    let view = account_service(&state).password_change_form(user.caller())?;
    Ok(render(&state, &user, View::PasswordChange(view)))
}

async fn password_change(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response> {
    match account_service(&state)
        .password_change(user.caller(), form)
        .await?
    {
        Submission::Accepted(account) => {
            let jar = state.sessions.login(jar, &account)?;
            Ok((jar, found("/auth/password_change/done/")).into_response())
        }
        Submission::Rejected(view) => Ok(render(&state, &user, View::PasswordChange(view))),
    }
}

async fn password_change_done(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response> {
    account_service(&state).password_change_done(user.caller())?;
    Ok(render(&state, &user, View::PasswordChangeDone))
}

