use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::password_fingerprint;
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    /// Fingerprint of the password hash the session was issued against.
    #[serde(default)]
    pub pwd: String,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Issues and reads the signed session cookie.
#[derive(Clone)]
pub struct SessionManager {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    cookie_name: String,
    expiry_hours: u64,
    secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            cookie_name: config.cookie_name.clone(),
            expiry_hours: config.expiry_hours,
            secure: config.secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.expiry_hours as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            pwd: password_fingerprint(&user.password_hash),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
    }

    /// `None` for tampered, expired or malformed tokens.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .ok()
    }

    /// Add the session cookie for `user` to the jar.
    pub fn login(&self, jar: CookieJar, user: &User) -> Result<CookieJar> {
        let token = self.issue_token(user)?;
        let cookie = Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        Ok(jar.add(cookie))
    }

    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }
}

/// Extracts the caller from the session cookie. Anonymous when the cookie is
/// missing or invalid, or when the account no longer exists.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
    pub fn caller(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(state.sessions.cookie_name()) else {
            return Ok(Self(None));
        };
        let Some(claims) = state.sessions.verify_token(cookie.value()) else {
            tracing::debug!("Ignoring invalid session cookie");
            return Ok(Self(None));
        };
        let Ok(user_id) = claims.sub.parse::<i64>() else {
            return Ok(Self(None));
        };

        let user = state
            .repo
            .find_user_by_id(user_id)
            .await?
            .filter(|user| password_fingerprint(&user.password_hash) == claims.pwd);
        if user.is_none() {
            tracing::debug!(user_id, "Session no longer matches an account");
        }
        Ok(Self(user.as_ref().map(SessionUser::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> SessionManager {
        SessionManager::new(&SessionConfig {
            secret: secret.to_string(),
            cookie_name: "sid".to_string(),
            expiry_hours: 1,
            secure: false,
        })
    }

    fn user() -> User {
        User {
            id: 7,
            username: "Anonimus".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn token_carries_user_identity() {
        let sessions = manager("secret");
        let token = sessions.issue_token(&user()).unwrap();
        let claims = sessions.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "Anonimus");
    }

    #[test]
    fn token_records_password_fingerprint() {
        let sessions = manager("secret");
        let hashed = User {
            password_hash: crate::auth::hash_password("pass-word-1").unwrap(),
            ..user()
        };
        let claims = sessions
            .verify_token(&sessions.issue_token(&hashed).unwrap())
            .unwrap();
        assert_eq!(claims.pwd, password_fingerprint(&hashed.password_hash));
        assert!(!claims.pwd.is_empty());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = manager("one").issue_token(&user()).unwrap();
        assert!(manager("two").verify_token(&token).is_none());
        assert!(manager("one").verify_token("not-a-token").is_none());
    }

    #[test]
    fn login_sets_http_only_cookie_and_logout_clears_it() {
        let sessions = manager("secret");
        let jar = sessions.login(CookieJar::new(), &user()).unwrap();
        let cookie = jar.get("sid").unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert!(sessions.verify_token(cookie.value()).is_some());

        let jar = sessions.logout(jar);
        assert!(jar.get("sid").is_none());
    }
}
