//! Account Flow Tests
//!
//! Coverage:
//! 1. Signup creates the user and logs them in
//! 2. Login honours a local `next`, rejects bad credentials
//! 3. Logout clears the session
//! 4. Password change requires login and the old password
//! 5. Password change ends sessions issued before it
//!
//! Run: cargo test --test accounts_test

use axum::http::{header, StatusCode};
use yatube::auth::verify_password;
use yatube::repository::BlogRepository;

mod test_harness;
use test_harness::{TestEnvironment, PASSWORD};

const SIGNUP: &str = "first_name=Anon&last_name=Imus&username=Anonimus&email=anon%40example.com&password1=long-enough-1&password2=long-enough-1";

#[tokio::test]
async fn test_signup_creates_and_logs_in_user() {
    let env = TestEnvironment::with_json();

    let response = env.post_form("/auth/signup/", None, SIGNUP).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));

    let user = env
        .repo
        .find_user_by_username("Anonimus")
        .await
        .unwrap()
        .expect("user stored");
    assert_eq!(user.email, "anon@example.com");

    let cookie = response.session_cookie().expect("session cookie");
    let body = env.get("/", Some(&cookie)).await.json();
    assert_eq!(body["user"], "Anonimus");
}

#[tokio::test]
async fn test_signup_duplicate_username_is_field_error() {
    let env = TestEnvironment::with_json();
    env.create_user("Anonimus").await;

    let response = env.post_form("/auth/signup/", None, SIGNUP).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["template"], "users/signup.html");
    assert!(body["context"]["errors"]["fields"]["username"].is_array());
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_signup_form_renders() {
    let env = TestEnvironment::new();
    let response = env.get("/auth/signup/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("name=\"password2\""));
}

#[tokio::test]
async fn test_login_returns_to_next() {
    let env = TestEnvironment::with_json();
    env.create_user("Anonimus").await;

    let page = env.get("/auth/login/?next=/create/", None).await.json();
    assert_eq!(page["context"]["form"]["next"], "/create/");

    let body = format!("username=Anonimus&password={}&next=%2Fcreate%2F", PASSWORD);
    let response = env.post_form("/auth/login/", None, &body).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/create/"));

    let cookie = response.session_cookie().expect("session cookie");
    let create = env.get("/create/", Some(&cookie)).await;
    assert_eq!(create.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let env = TestEnvironment::new();
    env.create_user("Anonimus").await;

    let body = format!(
        "username=Anonimus&password={}&next=https%3A%2F%2Fevil.example%2F",
        PASSWORD
    );
    let response = env.post_form("/auth/login/", None, &body).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
}

#[tokio::test]
async fn test_login_with_wrong_password_rerenders() {
    let env = TestEnvironment::with_json();
    env.create_user("Anonimus").await;

    let response = env
        .post_form("/auth/login/", None, "username=Anonimus&password=nope")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["template"], "users/login.html");
    assert_eq!(body["context"]["errors"]["non_field"].as_array().unwrap().len(), 1);
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let env = TestEnvironment::with_json();
    let user = env.create_user("Anonimus").await;
    let cookie = env.session_cookie(&user);

    let response = env.get("/auth/logout/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["template"], "users/logged_out.html");

    let set_cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("yatube_session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_password_change_flow() {
    let env = TestEnvironment::with_json();
    let user = env.create_user("Anonimus").await;
    let cookie = env.session_cookie(&user);

    let anonymous = env.get("/auth/password_change/", None).await;
    assert_eq!(anonymous.status, StatusCode::FOUND);
    assert_eq!(
        anonymous.location(),
        Some("/auth/login/?next=/auth/password_change/")
    );

    let wrong = env
        .post_form(
            "/auth/password_change/",
            Some(&cookie),
            "old_password=wrong&new_password1=fresh-pass-2&new_password2=fresh-pass-2",
        )
        .await;
    assert_eq!(wrong.status, StatusCode::OK);
    assert!(wrong.json()["context"]["errors"]["fields"]["old_password"].is_array());

    let body = format!(
        "old_password={}&new_password1=fresh-pass-2&new_password2=fresh-pass-2",
        PASSWORD
    );
    let response = env
        .post_form("/auth/password_change/", Some(&cookie), &body)
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/auth/password_change/done/"));

    let stored = env.repo.find_user_by_id(user.id).await.unwrap().unwrap();
    assert!(verify_password("fresh-pass-2", &stored.password_hash));

    let renewed = response.session_cookie().expect("session re-issued");
    let done = env
        .get("/auth/password_change/done/", Some(&renewed))
        .await;
    assert_eq!(done.status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_ends_other_sessions() {
    let env = TestEnvironment::with_json();
    let user = env.create_user("Anonimus").await;
    let elsewhere = env.session_cookie(&user);
    let here = env.session_cookie(&user);

    let body = format!(
        "old_password={}&new_password1=fresh-pass-2&new_password2=fresh-pass-2",
        PASSWORD
    );
    let response = env
        .post_form("/auth/password_change/", Some(&here), &body)
        .await;
    assert_eq!(response.status, StatusCode::FOUND);

    let stale = env.get("/auth/password_change/", Some(&elsewhere)).await;
    assert_eq!(stale.status, StatusCode::FOUND);
    assert_eq!(
        stale.location(),
        Some("/auth/login/?next=/auth/password_change/")
    );
    assert!(env.get("/", Some(&elsewhere)).await.json()["user"].is_null());

    let renewed = response.session_cookie().expect("session re-issued");
    let page = env.get("/auth/password_change/", Some(&renewed)).await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn test_about_pages_are_public() {
    let env = TestEnvironment::new();
    for uri in ["/about/author/", "/about/tech/"] {
        let response = env.get(uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "{}", uri);
    }
}
