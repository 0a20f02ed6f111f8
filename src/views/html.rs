use std::fmt::Write;

use axum::http::StatusCode;

use super::{
    DetailView, FeedView, GroupView, LoginView, PasswordChangeView, PostFormView, ProfileView,
    RenderContext, Renderer, SignupView, View,
};
use crate::forms::FormErrors;
use crate::models::PostCard;
use crate::pagination::Page;

const SITE_TITLE: &str = "Yatube";

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, ctx: RenderContext<'_>, body: &str) -> String {
    let nav = match ctx.caller {
        Some(user) => format!(
            r#"<a href="/create/">New post</a> <a href="/profile/{u}/">{u}</a> <a href="/auth/password_change/">Change password</a> <a href="/auth/logout/">Log out</a>"#,
            u = escape(&user.username)
        ),
        None => r#"<a href="/auth/login/">Log in</a> <a href="/auth/signup/">Sign up</a>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | {site}</title></head>
<body>
<header><nav><a href="/">{site}</a> <a href="/about/author/">About the author</a> <a href="/about/tech/">Technologies</a> {nav}</nav></header>
<main>
{body}
</main>
<footer>&copy; {site}</footer>
</body>
</html>
"#,
        title = escape(title),
        site = SITE_TITLE,
        nav = nav,
        body = body,
    )
}

/// Standalone page for error responses, which are produced without application state.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the feed</a></p>",
        status.as_u16(),
        escape(message)
    );
    layout(message, RenderContext::default(), &body)
}

fn errors_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errorlist\">");
    for message in messages {
        let _ = write!(out, "<li>{}</li>", escape(message));
    }
    out.push_str("</ul>");
    out
}

fn input(errors: &FormErrors, name: &str, label: &str, kind: &str, value: &str) -> String {
    format!(
        "<p><label for=\"id_{name}\">{label}</label> <input type=\"{kind}\" name=\"{name}\" id=\"id_{name}\" value=\"{value}\">{errors}</p>\n",
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
        errors = errors_list(errors.field(name)),
    )
}

/// Default presentation: server-rendered HTML.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    media_url_prefix: String,
}

impl HtmlRenderer {
    pub fn new(media_url_prefix: impl Into<String>) -> Self {
        Self {
            media_url_prefix: media_url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    fn post_card(&self, post: &PostCard, link_author: bool) -> String {
        let mut out = String::from("<article>\n<ul>\n");
        if link_author {
            let _ = writeln!(
                out,
                "<li>Author: <a href=\"/profile/{}/\">{}</a></li>",
                escape(&post.author_username),
                escape(&post.author_name())
            );
        } else {
            let _ = writeln!(out, "<li>Author: {}</li>", escape(&post.author_name()));
        }
        let _ = writeln!(
            out,
            "<li>Date: {}</li>\n</ul>",
            post.pub_date.format("%d %b %Y")
        );
        if let Some(image) = &post.image {
            let _ = writeln!(
                out,
                "<img src=\"{}/{}\" alt=\"\">",
                self.media_url_prefix,
                escape(image)
            );
        }
        let _ = writeln!(out, "<p>{}</p>", escape(&post.text).replace('\n', "<br>"));
        let _ = writeln!(
            out,
            "<a href=\"/posts/{}/\">Details</a>",
            post.id
        );
        if let (Some(slug), Some(title)) = (&post.group_slug, &post.group_title) {
            let _ = writeln!(
                out,
                "<p>Group: <a href=\"/group/{}/\">{}</a></p>",
                escape(slug),
                escape(title)
            );
        }
        out.push_str("</article>\n<hr>\n");
        out
    }

    fn paginator(page: &Page<PostCard>) -> String {
        if page.total_pages <= 1 {
            return String::new();
        }
        let mut out = String::from("<nav class=\"pagination\">");
        if let Some(prev) = page.previous_page_number() {
            let _ = write!(
                out,
                "<a href=\"?page=1\">First</a> <a href=\"?page={}\">Previous</a> ",
                prev
            );
        }
        let _ = write!(out, "<span>Page {} of {}</span>", page.number, page.total_pages);
        if let Some(next) = page.next_page_number() {
            let _ = write!(
                out,
                " <a href=\"?page={}\">Next</a> <a href=\"?page={}\">Last</a>",
                next, page.total_pages
            );
        }
        out.push_str("</nav>\n");
        out
    }

    fn feed(&self, page: &Page<PostCard>, link_author: bool) -> String {
        let mut out = String::new();
        for post in page.iter() {
            out.push_str(&self.post_card(post, link_author));
        }
        out.push_str(&Self::paginator(page));
        out
    }

    fn index(&self, view: &FeedView) -> (String, String) {
        let body = format!("<h1>Latest posts</h1>\n{}", self.feed(&view.page, true));
        ("Latest posts".to_string(), body)
    }

    fn group_list(&self, view: &GroupView) -> (String, String) {
        let body = format!(
            "<h1>{}</h1>\n<p>{}</p>\n{}",
            escape(&view.group.title),
            escape(&view.group.description),
            self.feed(&view.page, true)
        );
        (format!("Group {}", view.group.title), body)
    }

    fn profile(&self, view: &ProfileView) -> (String, String) {
        let name = view.author.display_name();
        let body = format!(
            "<h1>All posts by {}</h1>\n<h3>Total posts: {}</h3>\n{}",
            escape(&name),
            view.posts_count,
            self.feed(&view.page, false)
        );
        (format!("Profile of {}", name), body)
    }

    fn detail(&self, view: &DetailView, ctx: RenderContext<'_>) -> (String, String) {
        let post = &view.post;
        let mut body = String::new();
        let _ = writeln!(body, "<aside><ul>");
        let _ = writeln!(
            body,
            "<li>Published: {}</li>",
            post.pub_date.format("%d %b %Y")
        );
        if let (Some(slug), Some(title)) = (&post.group_slug, &post.group_title) {
            let _ = writeln!(
                body,
                "<li>Group: <a href=\"/group/{}/\">{}</a></li>",
                escape(slug),
                escape(title)
            );
        }
        let _ = writeln!(
            body,
            "<li>Author: {}</li>\n<li>Posts by this author: {}</li>",
            escape(&post.author_name()),
            view.author_posts_count
        );
        let _ = writeln!(
            body,
            "<li><a href=\"/profile/{}/\">All posts by this author</a></li>\n</ul></aside>",
            escape(&post.author_username)
        );
        if let Some(image) = &post.image {
            let _ = writeln!(
                body,
                "<img src=\"{}/{}\" alt=\"\">",
                self.media_url_prefix,
                escape(image)
            );
        }
        let _ = writeln!(body, "<article><p>{}</p></article>", escape(&post.text).replace('\n', "<br>"));
        if ctx.caller.map(|c| c.id) == Some(post.author_id) {
            let _ = writeln!(body, "<a href=\"/posts/{}/edit/\">Edit post</a>", post.id);
        }

        let title: String = post.text.chars().take(30).collect();
        (format!("Post {}", title), body)
    }

    fn post_form(&self, view: &PostFormView) -> (String, String) {
        let heading = if view.is_edit { "Edit post" } else { "New post" };
        let action = match (view.is_edit, view.post_id) {
            (true, Some(id)) => format!("/posts/{}/edit/", id),
            _ => "/create/".to_string(),
        };

        let mut body = format!("<h1>{}</h1>\n", heading);
        body.push_str(&errors_list(&view.errors.non_field));
        let _ = writeln!(
            body,
            "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">",
            action
        );
        let _ = writeln!(
            body,
            "<p><label for=\"id_text\">Post text</label>\n<textarea name=\"text\" id=\"id_text\" cols=\"40\" rows=\"10\">{}</textarea>\n<small>Write your post</small>{}</p>",
            escape(&view.form.text),
            errors_list(view.errors.field("text"))
        );

        let _ = write!(
            body,
            "<p><label for=\"id_group\">Group</label>\n<select name=\"group\" id=\"id_group\">\n<option value=\"\">---------</option>\n"
        );
        for group in &view.groups {
            let selected = if view.form.group.trim() == group.id.to_string() {
                " selected"
            } else {
                ""
            };
            let _ = writeln!(
                body,
                "<option value=\"{}\"{}>{}</option>",
                group.id,
                selected,
                escape(&group.title)
            );
        }
        let _ = writeln!(
            body,
            "</select>\n<small>Choose a group</small>{}</p>",
            errors_list(view.errors.field("group"))
        );

        body.push_str("<p><label for=\"id_image\">Image</label>\n");
        if let Some(image) = &view.current_image {
            let _ = writeln!(
                body,
                "Currently: <a href=\"{prefix}/{img}\">{img}</a> <input type=\"checkbox\" name=\"image-clear\" id=\"image-clear_id\"> <label for=\"image-clear_id\">Clear</label><br>",
                prefix = self.media_url_prefix,
                img = escape(image)
            );
        }
        let _ = writeln!(
            body,
            "<input type=\"file\" name=\"image\" accept=\"image/*\" id=\"id_image\">{}</p>",
            errors_list(view.errors.field("image"))
        );
        let _ = writeln!(
            body,
            "<button type=\"submit\">{}</button>\n</form>",
            if view.is_edit { "Save" } else { "Add" }
        );

        (heading.to_string(), body)
    }

    fn signup(&self, view: &SignupView) -> (String, String) {
        let form = &view.form;
        let errors = &view.errors;
        let mut body = String::from("<h1>Sign up</h1>\n");
        body.push_str(&errors_list(&errors.non_field));
        body.push_str("<form method=\"post\" action=\"/auth/signup/\">\n");
        body.push_str(&input(errors, "first_name", "First name", "text", &form.first_name));
        body.push_str(&input(errors, "last_name", "Last name", "text", &form.last_name));
        body.push_str(&input(errors, "username", "Username", "text", &form.username));
        body.push_str(&input(
            errors,
            "email",
            "Email address",
            "email",
            form.email.as_deref().unwrap_or_default(),
        ));
        body.push_str(&input(errors, "password1", "Password", "password", ""));
        body.push_str(&input(errors, "password2", "Password confirmation", "password", ""));
        body.push_str("<button type=\"submit\">Sign up</button>\n</form>");
        ("Sign up".to_string(), body)
    }

    fn login(&self, view: &LoginView) -> (String, String) {
        let errors = &view.errors;
        let mut body = String::from("<h1>Log in</h1>\n");
        body.push_str(&errors_list(&errors.non_field));
        body.push_str("<form method=\"post\" action=\"/auth/login/\">\n");
        body.push_str(&input(errors, "username", "Username", "text", &view.form.username));
        body.push_str(&input(errors, "password", "Password", "password", ""));
        if let Some(next) = &view.form.next {
            let _ = writeln!(
                body,
                "<input type=\"hidden\" name=\"next\" value=\"{}\">",
                escape(next)
            );
        }
        body.push_str("<button type=\"submit\">Log in</button>\n</form>\n");
        body.push_str("<p><a href=\"/auth/signup/\">No account yet? Sign up</a></p>");
        ("Log in".to_string(), body)
    }

    fn password_change(&self, view: &PasswordChangeView) -> (String, String) {
        let errors = &view.errors;
        let mut body = String::from("<h1>Change password</h1>\n");
        body.push_str(&errors_list(&errors.non_field));
        body.push_str("<form method=\"post\" action=\"/auth/password_change/\">\n");
        body.push_str(&input(errors, "old_password", "Old password", "password", ""));
        body.push_str(&input(errors, "new_password1", "New password", "password", ""));
        body.push_str(&input(
            errors,
            "new_password2",
            "New password confirmation",
            "password",
            "",
        ));
        body.push_str("<button type=\"submit\">Change password</button>\n</form>");
        ("Change password".to_string(), body)
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, view: &View, ctx: RenderContext<'_>) -> String {
        let (title, body) = match view {
            View::Index(v) => self.index(v),
            View::GroupList(v) => self.group_list(v),
            View::Profile(v) => self.profile(v),
            View::PostDetail(v) => self.detail(v, ctx),
            View::PostForm(v) => self.post_form(v),
            View::Signup(v) => self.signup(v),
            View::Login(v) => self.login(v),
            View::LoggedOut => (
                "Logged out".to_string(),
                "<h1>You have been logged out</h1>\n<p><a href=\"/auth/login/\">Log in again</a></p>"
                    .to_string(),
            ),
            View::PasswordChange(v) => self.password_change(v),
            View::PasswordChangeDone => (
                "Password changed".to_string(),
                "<h1>Password changed</h1>\n<p>Your password was changed.</p>".to_string(),
            ),
            View::AboutAuthor => (
                "About the author".to_string(),
                "<h1>About the author</h1>\n<p>A student project: a small blog where anyone can write posts, \
                 group them by topic and follow what others publish.</p>"
                    .to_string(),
            ),
            View::AboutTech => (
                "Technologies".to_string(),
                "<h1>Technologies</h1>\n<p>Rust, axum, sqlx and PostgreSQL, with server-rendered HTML.</p>"
                    .to_string(),
            ),
        };
        layout(&title, ctx, &body)
    }
}
