mod accounts;
mod posts;

pub use accounts::*;
pub use posts::*;

use crate::auth::SessionUser;
use crate::error::{AppError, Result};

/// Result of a form submission that passed or failed validation.
/// Validation failures are not errors: the form is shown again with messages.
#[derive(Debug)]
pub enum Submission<T, V> {
    Accepted(T),
    Rejected(V),
}

/// The caller, or `LoginRequired` carrying the page to come back to.
pub(crate) fn require_login<'a>(
    caller: Option<&'a SessionUser>,
    next: impl Into<String>,
) -> Result<&'a SessionUser> {
    caller.ok_or_else(|| AppError::LoginRequired { next: next.into() })
}
