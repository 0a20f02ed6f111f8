//! Per-operation view structs and the presentation seam that turns them into pages.
pub mod html;
pub mod json;

use serde::Serialize;

use crate::auth::SessionUser;
use crate::forms::{FormErrors, LoginForm, PostForm, SignupForm};
use crate::models::{Group, PostCard, User};
use crate::pagination::Page;

#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub group: Group,
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub author: User,
    pub page: Page<PostCard>,
    pub posts_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub post: PostCard,
    pub author_posts_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostFormView {
    pub form: PostForm,
    pub errors: FormErrors,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub post_id: Option<i64>,
    pub current_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupView {
    pub form: SignupForm,
    pub errors: FormErrors,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginView {
    pub form: LoginForm,
    pub errors: FormErrors,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PasswordChangeView {
    pub errors: FormErrors,
}

/// Serialized untagged, so a view's context is just its fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum View {
    Index(FeedView),
    GroupList(GroupView),
    Profile(ProfileView),
    PostDetail(DetailView),
    PostForm(PostFormView),
    Signup(SignupView),
    Login(LoginView),
    LoggedOut,
    PasswordChange(PasswordChangeView),
    PasswordChangeDone,
    AboutAuthor,
    AboutTech,
}

impl View {
    pub fn template_name(&self) -> &'static str {
        match self {
            View::Index(_) => "posts/index.html",
            View::GroupList(_) => "posts/group_list.html",
            View::Profile(_) => "posts/profile.html",
            View::PostDetail(_) => "posts/post_detail.html",
            View::PostForm(_) => "posts/create_post.html",
            View::Signup(_) => "users/signup.html",
            View::Login(_) => "users/login.html",
            View::LoggedOut => "users/logged_out.html",
            View::PasswordChange(_) => "users/password_change_form.html",
            View::PasswordChangeDone => "users/password_change_done.html",
            View::AboutAuthor => "about/author.html",
            View::AboutTech => "about/tech.html",
        }
    }
}

/// Request-wide data every page may show.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub caller: Option<&'a SessionUser>,
}

/// Turns a view into a response body. Swappable in `AppState`.
pub trait Renderer: Send + Sync {
    fn render(&self, view: &View, ctx: RenderContext<'_>) -> String;

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}
