// Account service - signup, login and password change
use std::sync::Arc;

use super::{require_login, Submission};
use crate::auth::{hash_password, verify_password, SessionUser};
use crate::error::{AppError, Result};
use crate::forms::{self, LoginForm, PasswordChangeForm, SignupForm};
use crate::models::{NewUser, User};
use crate::repository::BlogRepository;
use crate::views::{LoginView, PasswordChangeView, SignupView};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const WRONG_OLD_PASSWORD: &str =
    "Your old password was entered incorrectly. Please enter it again.";

pub struct AccountService {
    repo: Arc<dyn BlogRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Register a new account. The caller logs the returned user in.
    pub async fn signup(&self, form: SignupForm) -> Result<Submission<User, SignupView>> {
        let form = form.normalized();
        let mut errors = form.check();

        if !errors.has_field("username") && self.repo.username_taken(&form.username).await? {
            errors.add("username", USERNAME_TAKEN);
        }
        if !errors.is_empty() {
            return Ok(Submission::Rejected(SignupView { form, errors }));
        }

        let created = self
            .repo
            .create_user(NewUser {
                username: form.username.clone(),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                email: form.email.clone().unwrap_or_default(),
                password_hash: hash_password(&form.password1)?,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "User registered");
                Ok(Submission::Accepted(user))
            }
            // Lost a race with a concurrent signup for the same name.
            Err(AppError::Conflict(_)) => {
                errors.add("username", USERNAME_TAKEN);
                Ok(Submission::Rejected(SignupView { form, errors }))
            }
            Err(e) => Err(e),
        }
    }

    /// Check credentials. A failure never says which of the two was wrong.
    pub async fn login(&self, form: LoginForm) -> Result<Submission<User, LoginView>> {
        let mut errors = forms::collect(&form);
        if !errors.is_empty() {
            return Ok(Submission::Rejected(LoginView { form, errors }));
        }

        let user = self.repo.find_user_by_username(form.username.trim()).await?;
        match user {
            Some(user) if verify_password(&form.password, &user.password_hash) => {
                tracing::info!(user_id = user.id, "User logged in");
                Ok(Submission::Accepted(user))
            }
            _ => {
                tracing::debug!(username = %form.username, "Login failed");
                errors.add_non_field(LoginForm::INVALID_LOGIN);
                Ok(Submission::Rejected(LoginView { form, errors }))
            }
        }
    }

    pub fn password_change_form(&self, caller: Option<&SessionUser>) -> Result<PasswordChangeView> {
        require_login(caller, "/auth/password_change/")?;
        Ok(PasswordChangeView::default())
    }

    pub fn password_change_done(&self, caller: Option<&SessionUser>) -> Result<()> {
        require_login(caller, "/auth/password_change/done/")?;
        Ok(())
    }

    /// Returns the user with the new hash so the session can be re-issued.
    pub async fn password_change(
        &self,
        caller: Option<&SessionUser>,
        form: PasswordChangeForm,
    ) -> Result<Submission<User, PasswordChangeView>> {
        let caller = require_login(caller, "/auth/password_change/")?;
        let user = self
            .repo
            .find_user_by_id(caller.id)
            .await?
            .ok_or_else(|| AppError::LoginRequired {
                next: "/auth/password_change/".to_string(),
            })?;

        let mut errors = form.check();
        if !form.old_password.is_empty() && !verify_password(&form.old_password, &user.password_hash)
        {
            errors.add("old_password", WRONG_OLD_PASSWORD);
        }
        if !errors.is_empty() {
            return Ok(Submission::Rejected(PasswordChangeView { errors }));
        }

        let password_hash = hash_password(&form.new_password1)?;
        self.repo.update_password(user.id, &password_hash).await?;
        tracing::info!(user_id = user.id, "Password changed");

        Ok(Submission::Accepted(User {
            password_hash,
            ..user
        }))
    }
}
