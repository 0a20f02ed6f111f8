use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{not_blank, FormErrors};

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

fn valid_username(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if value.chars().count() > USERNAME_MAX_LEN {
        let mut error = ValidationError::new("max_length");
        error.message = Some("Ensure this value has at most 150 characters.".into());
        return Err(error);
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        );
        return Err(error);
    }
    Ok(())
}

/// Strength rules applied to every new password.
fn password_strength(field: &str, password: &str, errors: &mut FormErrors) {
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_LEN
            ),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "valid_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl SignupForm {
    /// Blank optional inputs arrive as empty strings; treat them as absent.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    /// Field rules that do not need storage. Username uniqueness is checked by the service.
    pub fn check(&self) -> FormErrors {
        let mut errors = super::collect(self);
        if self.password1.is_empty() {
            errors.add("password1", super::REQUIRED);
        } else {
            password_strength("password2", &self.password1, &mut errors);
        }
        if self.password2.is_empty() {
            errors.add("password2", super::REQUIRED);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn’t match.");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub const INVALID_LOGIN: &'static str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

    /// `next` when it is a path on this site, otherwise `/`.
    pub fn redirect_target(&self) -> String {
        safe_next(self.next.as_deref()).unwrap_or_else(|| "/".to_string())
    }
}

/// Accept only local absolute paths so `next` cannot bounce users off-site.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next.to_string())
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub old_password: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub new_password1: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub new_password2: String,
}

impl PasswordChangeForm {
    /// Checks everything except the old password, which needs the stored hash.
    pub fn check(&self) -> FormErrors {
        let mut errors = super::collect(self);
        if !self.new_password1.is_empty() && !self.new_password2.is_empty() {
            if self.new_password1 != self.new_password2 {
                errors.add("new_password2", "The two password fields didn’t match.");
            } else {
                password_strength("new_password2", &self.new_password2, &mut errors);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignupForm {
        SignupForm {
            first_name: "Anon".into(),
            last_name: "Imus".into(),
            username: "Anonimus".into(),
            email: Some("test@test.ru".into()),
            password1: "s3cret-pass".into(),
            password2: "s3cret-pass".into(),
        }
    }

    #[test]
    fn complete_signup_is_valid() {
        assert!(signup().normalized().check().is_empty());
    }

    #[test]
    fn signup_rejects_bad_username_and_email() {
        let form = SignupForm {
            username: "bad name!".into(),
            email: Some("not-an-email".into()),
            ..signup()
        }
        .normalized();
        let errors = form.check();
        assert!(errors.has_field("username"));
        assert!(errors.has_field("email"));
    }

    #[test]
    fn signup_blank_email_is_allowed() {
        let form = SignupForm {
            email: Some("   ".into()),
            ..signup()
        }
        .normalized();
        assert_eq!(form.email, None);
        assert!(form.check().is_empty());
    }

    #[test]
    fn signup_password_rules() {
        let mismatch = SignupForm {
            password2: "other-pass".into(),
            ..signup()
        };
        assert!(mismatch.check().has_field("password2"));

        let numeric = SignupForm {
            password1: "12345678".into(),
            password2: "12345678".into(),
            ..signup()
        };
        assert_eq!(numeric.check().field("password2"), ["This password is entirely numeric."]);

        let short = SignupForm {
            password1: "abc".into(),
            password2: "abc".into(),
            ..signup()
        };
        assert!(short.check().has_field("password2"));
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/create/")), Some("/create/".to_string()));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example/")), None);
        assert_eq!(safe_next(None), None);

        let form = LoginForm {
            next: Some("http://evil.example".into()),
            ..Default::default()
        };
        assert_eq!(form.redirect_target(), "/");
    }

    #[test]
    fn password_change_requires_matching_new_passwords() {
        let form = PasswordChangeForm {
            old_password: "old".into(),
            new_password1: "new-password-1".into(),
            new_password2: "new-password-2".into(),
        };
        assert!(form.check().has_field("new_password2"));

        let form = PasswordChangeForm {
            new_password2: "new-password-1".into(),
            ..form
        };
        assert!(form.check().is_empty());
    }
}
