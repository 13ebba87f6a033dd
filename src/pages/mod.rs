//! Page controllers
//!
//! Each page holds transient copies of backend entities plus the notice
//! (toast) produced by its last action. Pages take `&self` everywhere and keep
//! their state behind a mutex, so a renderer may drive them from several tasks
//! at once. After a successful mutation a page re-fetches what it shows.

pub mod account;
pub mod catalog;
pub mod fines;
pub mod listing;
pub mod loan_desk;
pub mod notifications;
pub mod reports;
pub mod users;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    error::{AppError, AppResult},
    models::user::Identity,
    services::{access::RESTRICTED_NOTICE, session::SessionService},
};

/// Fixed text for an empty listing
pub const NOTHING_FOUND: &str = "Nothing found.";

/// Feedback shown after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    Info(String),
    /// Session missing or rejected: go to the login page
    LoginRequired,
    Restricted,
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Error(text) | Notice::Info(text) => text,
            Notice::LoginRequired => "Please sign in again.",
            Notice::Restricted => RESTRICTED_NOTICE,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Success(_) | Notice::Info(_))
    }
}

impl From<&AppError> for Notice {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Unauthorized(_) => Notice::LoginRequired,
            AppError::Forbidden(_) => Notice::Restricted,
            other => Notice::Error(other.user_message()),
        }
    }
}

/// Identity of a signed-in librarian
pub(crate) fn require_librarian(session: &SessionService) -> AppResult<Identity> {
    let identity = session.require()?;
    if !identity.is_librarian() {
        return Err(AppError::Forbidden(RESTRICTED_NOTICE.to_string()));
    }
    Ok(identity)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
