//! Accounts plumbing: argon2 password hashes and signed session cookies.
mod password;
mod session;

pub use password::{hash_password, password_fingerprint, verify_password, UNUSABLE_PASSWORD};
pub use session::{Claims, CurrentUser, SessionManager, SessionUser};
